pub mod executor;
pub mod retry;
pub mod template;
pub mod transport;

pub use executor::{ApiCall, Credentials, HttpExecutor, RequestOutcome, RequestPolicy};
pub use retry::RetryPolicy;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
