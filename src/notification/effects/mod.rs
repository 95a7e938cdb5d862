//! 副作用执行器实现

pub mod audio;
pub mod os_notify;
pub mod toast;

pub use audio::{AudioCuePlayer, CueError, CueStrategy};
pub use os_notify::{OsNotificationEmitter, PermissionGate, PermissionState};
pub use toast::{Toast, ToastPresenter};
