//! Browser side of lazy image loading.
//!
//! Binds [`LazyImageLoader`] to real `<img>` elements: the element is the
//! [`ImageTarget`], an off-DOM `Image` is the fetch primitive, and an
//! `IntersectionObserver` decides when an element is close enough to the
//! viewport to resolve.

use crate::config::{LAZY_IMAGE_SELECTOR, PRELOAD_COUNT, ROOT_MARGIN_PX, VISIBILITY_THRESHOLD};
use crate::lazy_image::{
    DeferredImage, ImageFetcher, ImageLoadError, ImageState, ImageTarget, LazyImageLoader,
};
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlImageElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

pub const DEFERRED_SRC_ATTR: &str = "data-src";

type BrowserImage = Rc<DeferredImage<HtmlImageElement>>;

impl ImageTarget for HtmlImageElement {
    fn set_displayed_src(&self, src: &str) {
        self.set_src(src);
    }

    fn set_state_tag(&self, state: ImageState) {
        let classes = self.class_list();
        let pending = ImageState::Pending.css_class();
        let loading = ImageState::Loading.css_class();
        let loaded = ImageState::Loaded.css_class();
        let result = match state {
            ImageState::Pending => classes.add_1(pending),
            ImageState::Loading => classes.add_1(loading),
            ImageState::Loaded => classes
                .remove_2(pending, loading)
                .and_then(|_| classes.add_1(loaded)),
            ImageState::Fallback => {
                self.set_title("Image failed to load");
                classes
                    .remove_2(pending, loading)
                    .and_then(|_| classes.add_2(loaded, ImageState::Fallback.css_class()))
            }
        };
        if result.is_err() {
            warn!("Could not update image class list for state {:?}", state);
        }
    }
}

/// Loads images through an off-DOM `Image`, the same way the browser would
/// for a visible `<img>`, so a successful load leaves the bytes in the HTTP
/// cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserImageFetcher;

impl ImageFetcher for BrowserImageFetcher {
    type Handle = HtmlImageElement;

    fn fetch(&self, src: &str) -> LocalBoxFuture<'static, Result<HtmlImageElement, ImageLoadError>> {
        let src = src.to_string();
        async move {
            let img = HtmlImageElement::new().map_err(|_| ImageLoadError::Failed(src.clone()))?;

            let (tx, rx) = oneshot::channel::<bool>();
            let tx = Rc::new(RefCell::new(Some(tx)));
            let notify = |ok: bool| {
                let tx = Rc::clone(&tx);
                Closure::<dyn FnMut()>::new(move || {
                    if let Some(tx) = tx.borrow_mut().take() {
                        let _ = tx.send(ok);
                    }
                })
            };
            let on_load = notify(true);
            let on_error = notify(false);

            img.set_onload(Some(on_load.as_ref().unchecked_ref()));
            img.set_onerror(Some(on_error.as_ref().unchecked_ref()));
            img.set_src(&src);

            let loaded = rx.await.unwrap_or(false);
            img.set_onload(None);
            img.set_onerror(None);

            if loaded {
                Ok(img)
            } else {
                Err(ImageLoadError::Failed(src))
            }
        }
        .boxed_local()
    }
}

/// Keeps an observer and its callback alive. Dropping it disconnects the
/// observer; loads already issued still run to completion.
pub struct LazyImageObserver {
    observer: Option<IntersectionObserver>,
    _callback: Option<Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>>,
    observed: usize,
}

impl LazyImageObserver {
    fn detached() -> Self {
        Self {
            observer: None,
            _callback: None,
            observed: 0,
        }
    }

    /// Number of elements handed to the observer (preloads excluded).
    pub fn observed(&self) -> usize {
        self.observed
    }
}

impl Drop for LazyImageObserver {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}

fn spawn_resolution(task: LocalBoxFuture<'static, ImageState>) {
    wasm_bindgen_futures::spawn_local(async move {
        let state = task.await;
        debug!("Image settled as {:?}", state);
    });
}

/// Collect unresolved lazy images under `root`.
pub fn deferred_images(root: &Element) -> Vec<BrowserImage> {
    let Ok(nodes) = root.query_selector_all(LAZY_IMAGE_SELECTOR) else {
        return Vec::new();
    };
    let busy = [ImageState::Loading.css_class(), ImageState::Loaded.css_class()];

    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<HtmlImageElement>().ok())
        .filter(|img| !busy.iter().any(|class| img.class_list().contains(class)))
        .filter_map(|img| {
            let src = img.get_attribute(DEFERRED_SRC_ATTR)?;
            Some(DeferredImage::new(img, src))
        })
        .collect()
}

fn observer_supported() -> bool {
    js_sys::Reflect::has(&gloo_utils::window(), &JsValue::from_str("IntersectionObserver"))
        .unwrap_or(false)
}

fn build_observer<F>(
    loader: &LazyImageLoader<F>,
    images: Vec<BrowserImage>,
) -> Option<(IntersectionObserver, Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>)>
where
    F: ImageFetcher + 'static,
{
    let loader = loader.clone();
    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }
                let target = entry.target();
                observer.unobserve(&target);
                let found = images
                    .iter()
                    .find(|image| image.target().unchecked_ref::<Element>() == &target);
                if let Some(task) = found.and_then(|image| loader.resolve(image)) {
                    spawn_resolution(task);
                }
            }
        },
    );

    let init = IntersectionObserverInit::new();
    init.set_root_margin(&format!("{}px 0px", ROOT_MARGIN_PX));
    init.set_threshold(&JsValue::from_f64(VISIBILITY_THRESHOLD));
    match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
        Ok(observer) => Some((observer, callback)),
        Err(err) => {
            warn!("IntersectionObserver unavailable: {:?}", err);
            None
        }
    }
}

/// Register every unresolved lazy image under `root`.
///
/// The first `PRELOAD_COUNT` are resolved straight away to avoid pop-in
/// above the fold. The rest resolve once they come within `ROOT_MARGIN_PX`
/// of the viewport, or immediately when the browser cannot observe
/// visibility.
pub fn observe_for_lazy_load<F>(loader: &LazyImageLoader<F>, root: &Element) -> LazyImageObserver
where
    F: ImageFetcher + 'static,
{
    let images = deferred_images(root);
    if images.is_empty() {
        return LazyImageObserver::detached();
    }

    for task in loader.preload(&images, PRELOAD_COUNT) {
        spawn_resolution(task);
    }
    let rest: Vec<BrowserImage> = images
        .into_iter()
        .skip(PRELOAD_COUNT)
        .filter(|image| image.state() == ImageState::Pending)
        .collect();

    let built = if observer_supported() {
        build_observer(loader, rest.clone())
    } else {
        None
    };

    let Some((observer, callback)) = built else {
        debug!("Resolving {} images without visibility observation", rest.len());
        for image in &rest {
            if let Some(task) = loader.resolve(image) {
                spawn_resolution(task);
            }
        }
        return LazyImageObserver::detached();
    };

    for image in &rest {
        observer.observe(image.target());
    }
    debug!("Observing {} lazy images", rest.len());
    LazyImageObserver {
        observer: Some(observer),
        _callback: Some(callback),
        observed: rest.len(),
    }
}
