mod home;
mod not_found;
mod task_create;
mod task_detail;
mod task_list;
mod user_create;
mod user_detail;
mod user_list;

pub use home::HomeView;
pub use not_found::NotFoundView;
pub use task_create::TaskCreateView;
pub use task_detail::TaskDetailView;
pub use task_list::TaskListView;
pub use user_create::UserCreateView;
pub use user_detail::UserDetailView;
pub use user_list::UserListView;

use crate::context::Context;
use crate::router::Route;
use crate::ui::view::View;

/// Create the view for a route. Its queries subscribe immediately.
pub fn build(route: Route, ctx: &Context, title: &str) -> Box<dyn View> {
  match route {
    Route::Home => Box::new(HomeView::new(title)),
    Route::Users => Box::new(UserListView::new(ctx)),
    Route::UserCreate => Box::new(UserCreateView::new(ctx)),
    Route::UserDetail(id) => Box::new(UserDetailView::new(id, ctx)),
    Route::Tasks => Box::new(TaskListView::new(ctx)),
    Route::TaskCreate => Box::new(TaskCreateView::new(ctx)),
    Route::TaskDetail(id) => Box::new(TaskDetailView::new(id, ctx)),
    Route::NotFound => Box::new(NotFoundView),
  }
}
