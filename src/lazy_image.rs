//! Deferred image resolution with a shared FIFO cache.
//!
//! Every rendered image starts `Pending` with its real URL parked in a
//! deferred source. Resolving it moves it through
//! `Pending → Loading → Loaded | Fallback`, each step taken at most once; the
//! state tag on [`DeferredImage`] is what enforces "resolve once", not the
//! order in which observers are unregistered.
//!
//! The loader is host-agnostic: the element is reached through
//! [`ImageTarget`] and the network through [`ImageFetcher`]. The browser
//! implementations live in `viewport`.

use crate::cache::ImageCache;
use crate::config::{FALLBACK_IMAGE, IMAGE_CACHE_CAPACITY};
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Display state of one deferred image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageState {
    Pending,
    Loading,
    Loaded,
    Fallback,
}

impl ImageState {
    /// Class name the element carries while in this state.
    pub fn css_class(self) -> &'static str {
        match self {
            ImageState::Pending => "lazy-image",
            ImageState::Loading => "loading",
            ImageState::Loaded => "loaded",
            ImageState::Fallback => "fallback",
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, ImageState::Loaded | ImageState::Fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageLoadError {
    #[error("image failed to load: {0}")]
    Failed(String),
    #[error("image load abandoned before completion: {0}")]
    Abandoned(String),
}

/// The visual element a deferred image is rendered into.
pub trait ImageTarget {
    /// Replace the source the element currently shows.
    fn set_displayed_src(&self, src: &str);
    /// Swap the element's state tag.
    fn set_state_tag(&self, state: ImageState);
}

/// On-demand image loading primitive.
pub trait ImageFetcher {
    type Handle: Clone + 'static;

    /// Start loading `src`. The returned future runs to completion once
    /// started; there is no cancellation.
    fn fetch(&self, src: &str) -> LocalBoxFuture<'static, Result<Self::Handle, ImageLoadError>>;
}

/// An element whose real source is applied only once it is resolved.
pub struct DeferredImage<T> {
    target: T,
    src: String,
    state: Cell<ImageState>,
}

impl<T: ImageTarget> DeferredImage<T> {
    pub fn new(target: T, src: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            target,
            src: src.into(),
            state: Cell::new(ImageState::Pending),
        })
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn state(&self) -> ImageState {
        self.state.get()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// `Pending → Loading`. False if the element was already picked up.
    fn begin_loading(&self) -> bool {
        if self.state.get() != ImageState::Pending {
            return false;
        }
        self.transition(ImageState::Loading);
        true
    }

    /// `Loading → Loaded | Fallback`. A second settle is ignored and the
    /// existing terminal state is returned.
    fn settle(&self, loaded: bool, fallback_src: &str) -> ImageState {
        if self.state.get() != ImageState::Loading {
            return self.state.get();
        }
        if loaded {
            self.target.set_displayed_src(&self.src);
            self.transition(ImageState::Loaded);
        } else {
            self.target.set_displayed_src(fallback_src);
            self.transition(ImageState::Fallback);
        }
        self.state.get()
    }

    fn transition(&self, next: ImageState) {
        self.state.set(next);
        self.target.set_state_tag(next);
    }
}

type SharedFetch<H> = Shared<LocalBoxFuture<'static, Result<H, ImageLoadError>>>;
type InFlight<H> = RefCell<HashMap<String, SharedFetch<H>>>;

/// Resolves deferred images against a bounded cache.
///
/// Must stay on a single execution context: the cache and the in-flight
/// table are `RefCell`s mutated from the futures this loader hands out.
pub struct LazyImageLoader<F: ImageFetcher> {
    fetcher: Rc<F>,
    cache: Rc<RefCell<ImageCache<F::Handle>>>,
    in_flight: Rc<InFlight<F::Handle>>,
    fallback_src: Rc<str>,
}

impl<F: ImageFetcher> Clone for LazyImageLoader<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Rc::clone(&self.fetcher),
            cache: Rc::clone(&self.cache),
            in_flight: Rc::clone(&self.in_flight),
            fallback_src: Rc::clone(&self.fallback_src),
        }
    }
}

impl<F: ImageFetcher + 'static> LazyImageLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_capacity(fetcher, IMAGE_CACHE_CAPACITY, FALLBACK_IMAGE)
    }

    pub fn with_capacity(fetcher: F, capacity: usize, fallback_src: &str) -> Self {
        Self {
            fetcher: Rc::new(fetcher),
            cache: Rc::new(RefCell::new(ImageCache::new(capacity))),
            in_flight: Rc::new(RefCell::new(HashMap::new())),
            fallback_src: Rc::from(fallback_src),
        }
    }

    pub fn cache(&self) -> &Rc<RefCell<ImageCache<F::Handle>>> {
        &self.cache
    }

    pub fn fallback_src(&self) -> &str {
        &self.fallback_src
    }

    /// Number of distinct sources currently being fetched.
    pub fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Start resolving one element.
    ///
    /// Returns `None` when the element is no longer `Pending`, so calling
    /// this twice never issues a second load. Otherwise the returned future
    /// is the element's completion signal and yields its terminal state.
    /// A cache hit settles the element before this returns.
    pub fn resolve<T>(&self, image: &Rc<DeferredImage<T>>) -> Option<LocalBoxFuture<'static, ImageState>>
    where
        T: ImageTarget + 'static,
    {
        if !image.begin_loading() {
            return None;
        }

        if self.cache.borrow().contains(image.src()) {
            debug!("Image cache hit for {}", image.src());
            let state = image.settle(true, &self.fallback_src);
            return Some(future::ready(state).boxed_local());
        }

        let load = self.shared_fetch(image.src());
        let image = Rc::clone(image);
        let fallback_src = Rc::clone(&self.fallback_src);
        Some(
            async move {
                match load.await {
                    Ok(_) => image.settle(true, &fallback_src),
                    Err(err) => {
                        warn!("{}; showing fallback", err);
                        image.settle(false, &fallback_src)
                    }
                }
            }
            .boxed_local(),
        )
    }

    /// Eagerly resolve the first `limit` elements of a freshly rendered
    /// collection, skipping visibility observation for them.
    pub fn preload<T>(&self, images: &[Rc<DeferredImage<T>>], limit: usize) -> Vec<LocalBoxFuture<'static, ImageState>>
    where
        T: ImageTarget + 'static,
    {
        images
            .iter()
            .take(limit)
            .filter_map(|image| self.resolve(image))
            .collect()
    }

    /// Periodic low-priority trim of the shared cache.
    pub fn sweep_cache(&self) -> usize {
        self.cache.borrow_mut().sweep()
    }

    /// Join an in-flight load for `src` or start a new one. The shared task
    /// fills the cache itself, so concurrent waiters insert only once.
    fn shared_fetch(&self, src: &str) -> SharedFetch<F::Handle> {
        if let Some(existing) = self.in_flight.borrow().get(src) {
            debug!("Joining in-flight load for {}", src);
            return existing.clone();
        }

        let request = self.fetcher.fetch(src);
        let key = src.to_string();
        let cache = Rc::clone(&self.cache);
        let in_flight: Weak<InFlight<F::Handle>> = Rc::downgrade(&self.in_flight);
        let task = async move {
            let outcome = request.await;
            if let Some(table) = in_flight.upgrade() {
                table.borrow_mut().remove(&key);
            }
            if let Ok(handle) = &outcome {
                cache.borrow_mut().insert(key, handle.clone());
            }
            outcome
        }
        .boxed_local()
        .shared();

        self.in_flight
            .borrow_mut()
            .insert(src.to_string(), task.clone());
        task
    }
}
