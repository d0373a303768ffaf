use backoffice_dashboard::lazy_image::{ImageFetcher, LazyImageLoader};
use backoffice_dashboard::viewport::observe_for_lazy_load;
use log::debug;
use web_sys::{Element, HtmlInputElement};
use yew::prelude::*;

/// Holds the state and callbacks for a validated text field.
#[derive(Clone, PartialEq)]
pub struct ValidatedInput<T: Clone + PartialEq + 'static> {
    /// The current text content of the input field.
    pub text: String,
    /// The last value that passed validation, if any.
    pub value: Option<T>,
    /// Why the last commit was rejected.
    pub error: Option<String>,
    /// Callback for the input's `oninput` event.
    pub on_text_input: Callback<InputEvent>,
    /// Parse and validate the current text. Wire to `onchange` or a submit.
    pub on_commit: Callback<()>,
    /// Clear text, value and error.
    pub reset: Callback<()>,
}

/// Manage a text field whose content must parse into `T`.
///
/// The parsed value only changes on commit, so half-typed input never
/// reaches the caller.
#[hook]
pub fn use_validated_input<T>(parse_and_validate: fn(&str) -> Result<T, String>) -> ValidatedInput<T>
where
    T: Clone + PartialEq + 'static,
{
    let text = use_state(String::new);
    let value = use_state(|| None::<T>);
    let error = use_state(|| None::<String>);

    let on_text_input = {
        let text = text.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text.set(input.value());
        })
    };

    let on_commit = {
        let text = text.clone();
        let value = value.clone();
        let error = error.clone();
        Callback::from(move |_| match parse_and_validate(&text) {
            Ok(parsed) => {
                value.set(Some(parsed));
                error.set(None);
            }
            Err(msg) => {
                value.set(None);
                error.set(Some(msg));
            }
        })
    };

    let reset = {
        let text = text.clone();
        let value = value.clone();
        let error = error.clone();
        Callback::from(move |_| {
            text.set(String::new());
            value.set(None);
            error.set(None);
        })
    };

    ValidatedInput {
        text: (*text).clone(),
        value: (*value).clone(),
        error: (*error).clone(),
        on_text_input,
        on_commit,
        reset,
    }
}

/// Hand the lazy images rendered under `root` to the loader.
///
/// Re-scans whenever `generation` changes, i.e. after the list that owns
/// the images re-renders. The previous observer is disconnected first.
#[hook]
pub fn use_lazy_images<F>(root: NodeRef, loader: LazyImageLoader<F>, generation: usize)
where
    F: ImageFetcher + 'static,
{
    use_effect_with(generation, move |generation| {
        let observer = root
            .cast::<Element>()
            .map(|el| observe_for_lazy_load(&loader, &el));
        if let Some(observer) = &observer {
            debug!(
                "Lazy image scan #{} observing {} images",
                generation,
                observer.observed()
            );
        }
        move || drop(observer)
    });
}
