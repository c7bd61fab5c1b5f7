//! Network carrier lookup providers
//!
//! Both providers talk HTTP through the [`HttpTransport`] port so tests can
//! script responses and count requests; production wiring uses
//! [`ReqwestTransport`].

pub mod chahaoba;
pub mod throttle;
pub mod tool_lu;
pub mod transport;


pub use chahaoba::{ChahaobaConfig, ChahaobaProvider, CHAHAOBA_PROVIDER_NAME};
pub use throttle::RequestThrottle;
pub use tool_lu::{normalize_carrier, ToolLuConfig, ToolLuProvider, TOOLLU_PROVIDER_NAME};
pub use transport::{HttpBody, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
