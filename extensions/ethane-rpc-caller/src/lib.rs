mod caller_interface;
pub use caller_interface::*;

mod with_dispatcher;
pub use with_dispatcher::*;

mod transport;
pub use transport::*;

mod config;
pub use config::*;

mod subscription;
pub use subscription::*;

mod eth_api;
pub use eth_api::*;

mod param_validation;
pub use param_validation::*;

pub mod constants;
