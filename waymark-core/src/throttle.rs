//! Two-dimensional token-bucket throttling for provider calls.
//!
//! A [`Throttler`] gates calls on two independent buckets: one token per
//! request and one token per element (matrix cell or path leg). The buckets
//! are drawn from in that order and are never reserved together, so a caller
//! whose element wait fails has already spent its request token. Unused
//! request tokens refill with time and the drift is bounded by one token per
//! failed call.

use std::fmt;
use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::debug;

use crate::{
    ContextError, MapServiceError, MapsLimits, RequestContext, ThrottleDimension,
    ThrottledResource,
};

/// Rates and capacities for a [`Throttler`]. A zero rate disables that
/// dimension; a zero capacity defaults to the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ThrottleConfig {
    /// Requests refilled per second.
    pub requests_per_second: u32,
    /// Largest request burst.
    pub request_capacity: u32,
    /// Elements refilled per second.
    pub elements_per_second: u32,
    /// Largest element burst.
    pub element_capacity: u32,
}

impl ThrottleConfig {
    /// Both dimensions disabled.
    pub const UNLIMITED: Self = Self::new(0, 0);

    /// Rates with capacities equal to one second of refill.
    #[must_use]
    pub const fn new(requests_per_second: u32, elements_per_second: u32) -> Self {
        Self {
            requests_per_second,
            request_capacity: requests_per_second,
            elements_per_second,
            element_capacity: elements_per_second,
        }
    }

    /// Override the request bucket capacity.
    #[must_use]
    pub const fn with_request_capacity(mut self, capacity: u32) -> Self {
        self.request_capacity = capacity;
        self
    }

    /// Override the element bucket capacity.
    #[must_use]
    pub const fn with_element_capacity(mut self, capacity: u32) -> Self {
        self.element_capacity = capacity;
        self
    }
}

struct Bucket {
    limiter: DefaultDirectRateLimiter,
    capacity: NonZeroU32,
}

impl Bucket {
    fn new(rate: u32, capacity: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        let capacity = NonZeroU32::new(capacity).unwrap_or(rate);
        let quota = Quota::per_second(rate).allow_burst(capacity);
        Some(Self {
            limiter: RateLimiter::direct(quota),
            capacity,
        })
    }

    /// Draw `n` tokens. Requests larger than the bucket are drawn in
    /// capacity-sized chunks.
    async fn acquire(&self, ctx: &RequestContext, n: usize) -> Result<(), ContextError> {
        let capacity = usize::try_from(self.capacity.get()).unwrap_or(usize::MAX);
        let mut remaining = n;
        while let Some(chunk) = u32::try_from(remaining.min(capacity))
            .ok()
            .and_then(NonZeroU32::new)
        {
            let granted = ctx.run(self.limiter.until_n_ready(chunk)).await?;
            debug_assert!(granted.is_ok(), "chunk never exceeds bucket capacity");
            remaining -= remaining.min(capacity);
        }
        Ok(())
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Paces outbound calls against a request-rate and an element-rate budget.
///
/// Shared by every concurrent call to one provider for the lifetime of the
/// process.
///
/// # Examples
///
/// ```
/// use waymark_core::{RequestContext, ThrottleConfig, ThrottledResource, Throttler};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let throttler = Throttler::new(ThrottleConfig::UNLIMITED, ThrottledResource::Matrix);
/// throttler.wait(&RequestContext::new(), 10_000).await?;
/// # Ok::<(), waymark_core::MapServiceError>(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct Throttler {
    resource: ThrottledResource,
    requests: Option<Bucket>,
    elements: Option<Bucket>,
}

impl Throttler {
    /// Build a throttler for `resource`.
    #[must_use]
    pub fn new(config: ThrottleConfig, resource: ThrottledResource) -> Self {
        Self {
            resource,
            requests: Bucket::new(config.requests_per_second, config.request_capacity),
            elements: Bucket::new(config.elements_per_second, config.element_capacity),
        }
    }

    /// A throttler that never blocks.
    #[must_use]
    pub fn unlimited(resource: ThrottledResource) -> Self {
        Self::new(ThrottleConfig::UNLIMITED, resource)
    }

    /// Build a throttler sized for a provider: the request bucket holds one
    /// second of requests and the element bucket holds one full matrix call.
    #[must_use]
    pub fn for_limits(
        requests_per_second: u32,
        elements_per_second: u32,
        limits: &MapsLimits,
        resource: ThrottledResource,
    ) -> Self {
        let element_capacity =
            u32::try_from(limits.max_distance_matrix_elems()).unwrap_or(u32::MAX);
        Self::new(
            ThrottleConfig::new(requests_per_second, elements_per_second)
                .with_element_capacity(element_capacity),
            resource,
        )
    }

    /// Resource this throttler guards.
    #[must_use]
    pub const fn resource(&self) -> ThrottledResource {
        self.resource
    }

    /// Block until one request token and `elements` element tokens have been
    /// drawn, in that order.
    ///
    /// # Errors
    /// Returns [`MapServiceError::RateLimitExceeded`] naming the dimension
    /// being waited on when `ctx` is cancelled or its deadline passes.
    pub async fn wait(&self, ctx: &RequestContext, elements: usize) -> Result<(), MapServiceError> {
        if let Some(bucket) = &self.requests {
            bucket
                .acquire(ctx, 1)
                .await
                .map_err(|cause| self.exhausted(ThrottleDimension::Requests, cause))?;
        }
        if let Some(bucket) = &self.elements {
            bucket
                .acquire(ctx, elements)
                .await
                .map_err(|cause| self.exhausted(ThrottleDimension::Elements, cause))?;
        }
        Ok(())
    }

    fn exhausted(&self, dimension: ThrottleDimension, cause: ContextError) -> MapServiceError {
        debug!(
            "{} throttler gave up waiting for {dimension}: {cause}",
            self.resource
        );
        MapServiceError::RateLimitExceeded {
            resource: self.resource,
            dimension,
            cause,
        }
    }
}
