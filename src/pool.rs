//! Connection lending and the client handle analyses run against.
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::cardinality::Cardinality;
use crate::error::NegotiationError;
use crate::protocol::{Negotiated, Negotiator, OutputFormat, Session};

// ————————————————————————————————————————————————————————————————————————————
// POOL
// ————————————————————————————————————————————————————————————————————————————

/// A fixed set of connections lent out one lease at a time.
pub struct Pool<C> {
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C> {
    idle: Mutex<Vec<C>>,
    // one permit per idle connection
    permits: Arc<Semaphore>,
}

impl<C> PoolInner<C> {
    fn idle(&self) -> MutexGuard<'_, Vec<C>> {
        // a panic while holding the lock cannot leave the Vec half-updated
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C> Pool<C> {
    pub fn new(connections: Vec<C>) -> Self {
        let permits = Arc::new(Semaphore::new(connections.len()));
        Self {
            inner: Arc::new(PoolInner { idle: Mutex::new(connections), permits }),
        }
    }

    /// Wait for an idle connection. The connection goes back to the pool when
    /// the returned lease is dropped.
    pub async fn acquire(&self) -> Result<Lease<C>, NegotiationError> {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| NegotiationError::PoolClosed)?;
        let conn = self
            .inner
            .idle()
            .pop()
            .ok_or_else(|| NegotiationError::Connection("no idle connection behind permit".into()))?;
        tracing::debug!(idle = self.idle_count(), "lease acquired");
        Ok(Lease { conn: Some(conn), pool: self.inner.clone(), _permit: permit })
    }

    pub fn idle_count(&self) -> usize {
        self.inner.idle().len()
    }

    /// Fail every pending and future `acquire`.
    pub fn close(&self) {
        self.inner.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.permits.is_closed()
    }
}

impl<C> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

/// A borrowed connection.
pub struct Lease<C> {
    conn: Option<C>,
    pool: Arc<PoolInner<C>>,
    // released after `Drop::drop` has put the connection back
    _permit: OwnedSemaphorePermit,
}

impl<C> Deref for Lease<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl<C> DerefMut for Lease<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<C> Drop for Lease<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.idle().push(conn);
            tracing::debug!("lease released");
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CLIENT
// ————————————————————————————————————————————————————————————————————————————

/// An open client: a pool of connections, the negotiator that speaks over
/// them, and the session sent with every request.
pub struct Client<N: Negotiator> {
    pool: Pool<N::Connection>,
    negotiator: N,
    session: Session,
}

impl<N: Negotiator> Client<N> {
    pub fn new(negotiator: N, connections: Vec<N::Connection>) -> Self {
        Self { pool: Pool::new(connections), negotiator, session: Session::default() }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn pool(&self) -> &Pool<N::Connection> {
        &self.pool
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parse `query` over one leased connection, asking for binary output and
    /// "many" rows. The server reports the cardinality it actually resolved.
    ///
    /// The lease is released before this returns, on success and on error.
    pub async fn parse(&self, query: &str) -> Result<Negotiated, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let negotiated = self
            .negotiator
            .negotiate(&mut *conn, query, OutputFormat::Binary, Cardinality::Many, &self.session)
            .await;
        drop(conn);
        match &negotiated {
            Ok(n) => tracing::debug!(cardinality = %n.cardinality, "negotiated"),
            Err(error) => tracing::debug!(%error, "negotiation failed"),
        }
        negotiated
    }
}

// ------------------------------- Tests ------------------------------------ //
