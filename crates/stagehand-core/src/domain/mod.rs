//! Domain model (ids, handler names, reply context, notifications, errors).
//!
//! Event source にも handler にも依存しない値型だけを置きます。

pub mod errors;
pub mod handler_name;
pub mod ids;
pub mod notification;
pub mod outcome;
pub mod reply;

pub use self::errors::{
    BridgeError, BuildError, ConfigConversionFailure, DispatchError, GlobalConfigError,
    HandlerError, RegistryError,
};
pub use self::handler_name::{HandlerName, Namespace};
pub use self::ids::{CommandId, RedemptionId};
pub use self::notification::Notification;
pub use self::outcome::Dispatch;
pub use self::reply::{Correlation, ReplyContext, ReplyToken, Viewer};
