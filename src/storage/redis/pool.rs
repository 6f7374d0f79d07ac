//! Redis connection management

use crate::core::traits::CacheError;
use redis::{Client, aio::MultiplexedConnection};
use tracing::{debug, info};

/// Cache backend on a multiplexed Redis connection
///
/// The connection is cloned per operation; clones share one socket.
#[derive(Clone)]
pub struct RedisBackend {
    pub(super) connection: MultiplexedConnection,
    url: String,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("url", &Self::sanitize_url(&self.url))
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connect to the Redis server at `url`
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        info!("Connecting to Redis cache backend");
        debug!("Redis URL: {}", Self::sanitize_url(url));

        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        info!("Redis cache backend connected");
        Ok(Self {
            connection,
            url: url.to_string(),
        })
    }

    pub(super) fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Sanitize Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        let Some((scheme, rest)) = url.split_once("://") else {
            return "invalid_url".to_string();
        };
        match rest.rsplit_once('@') {
            Some((userinfo, host)) => match userinfo.split_once(':') {
                Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
                None => format!("{}://***@{}", scheme, host),
            },
            None => url.to_string(),
        }
    }
}
