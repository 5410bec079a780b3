//! Provider adapters for WebPro Metrics.
//!
//! Each adapter fetches one platform's metrics through the backend proxy,
//! paces itself with a token bucket and falls back to generated data whenever
//! the live path fails, so callers always get a renderable `PlatformData`.

pub mod adapter;
pub mod buckets;
pub mod gmb;
pub mod hubspot;
pub mod linkedin;
pub mod rate_limit;
pub mod router;
pub mod search_console;
pub mod shopify;
pub mod transport;
pub mod x;

pub use adapter::{AdapterContext, PlatformAdapter};
pub use buckets::BucketScheme;
pub use rate_limit::{RateLimitPolicy, TokenBucket};
pub use router::{ConnectorRouter, ResourceDirectory};
pub use transport::{HttpProxyTransport, ProxyTransport, StubResponse, StubTransport};
