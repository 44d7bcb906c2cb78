use crate::browser;
use anyhow::{anyhow, bail, Result};
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlAudioElement, HtmlImageElement};

/// ELI5:
/// ┌──────────────────── Load Gate ────────────────────────┐
/// │  queue()        →  total += 1   →  loaded = false     │
/// │  item_loaded()  →  loaded += 1                        │
/// │  item_failed()  →  failed += 1                        │
/// │  -----------                                          │
/// │  loaded + failed == total  →  fire on_complete ONCE   │
/// └───────────────────────────────────────────────────────┘
type CompletionCallback = Box<dyn FnOnce(LoadReport)>;

/// Snapshot used for the "Loaded N of M" message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

impl std::fmt::Display for LoadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Loaded {} of {}", self.loaded, self.total)
    }
}

/// Outcome handed to the completion callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub total: usize,
    pub failed: Vec<String>,
}

impl LoadReport {
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(anyhow!(
                "{} of {} assets failed to load : {}",
                self.failed.len(),
                self.total,
                self.failed.join(", ")
            ))
        }
    }
}

/// Counter gate that defers game start until every queued asset reported.
/// Holds no browser handles so it can be driven from plain tests.
#[derive(Default)]
pub struct LoadTracker {
    loaded_count: usize,
    total_count: usize,
    failed: Vec<String>,
    on_complete: Option<CompletionCallback>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing queued counts as loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded_count + self.failed.len() == self.total_count
    }

    pub fn queue(&mut self) {
        self.total_count += 1;
    }

    pub fn item_loaded(&mut self) -> LoadProgress {
        self.loaded_count += 1;
        self.settle();
        self.progress()
    }

    pub fn item_failed(&mut self, url: impl Into<String>) -> LoadProgress {
        self.failed.push(url.into());
        self.settle();
        self.progress()
    }

    /// Runs `callback` right away when nothing is pending, otherwise stores
    /// it (replacing an earlier one) until the last queued asset reports.
    pub fn on_complete(&mut self, callback: impl FnOnce(LoadReport) + 'static) {
        if self.is_loaded() {
            callback(self.report());
        } else {
            self.on_complete = Some(Box::new(callback));
        }
    }

    pub fn progress(&self) -> LoadProgress {
        LoadProgress {
            loaded: self.loaded_count,
            total: self.total_count,
        }
    }

    pub fn report(&self) -> LoadReport {
        LoadReport {
            loaded: self.loaded_count,
            total: self.total_count,
            failed: self.failed.clone(),
        }
    }

    fn settle(&mut self) {
        if !self.is_loaded() {
            return;
        }
        // take() leaves None behind, so a later report cannot fire it again
        if let Some(callback) = self.on_complete.take() {
            callback(self.report());
        }
    }
}

/// Audio container picked for `load_sound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    Ogg,
    Mp3,
}

impl SoundFormat {
    const OGG_MIME: &'static str = "audio/ogg; codecs=\"vorbis\"";
    const MP3_MIME: &'static str = "audio/mpeg";

    /// ogg wins over mp3 when both are playable
    pub fn choose(ogg_support: bool, mp3_support: bool) -> Option<Self> {
        match (ogg_support, mp3_support) {
            (true, _) => Some(SoundFormat::Ogg),
            (false, true) => Some(SoundFormat::Mp3),
            (false, false) => None,
        }
    }

    pub fn detect() -> Result<Option<Self>> {
        let audio = browser::new_audio()?;
        Ok(Self::choose(
            browser::can_play_type(&audio, Self::OGG_MIME),
            browser::can_play_type(&audio, Self::MP3_MIME),
        ))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SoundFormat::Ogg => ".ogg",
            SoundFormat::Mp3 => ".mp3",
        }
    }
}

/// Browser side of the gate: creates the elements and wires their load and
/// error events into the shared `LoadTracker`.
pub struct Loader {
    tracker: Rc<RefCell<LoadTracker>>,
    sound_format: Option<SoundFormat>,
}

impl Loader {
    pub fn init() -> Result<Self> {
        let sound_format = SoundFormat::detect()?;
        if sound_format.is_none() {
            log!("Loader: browser plays neither ogg nor mp3, sounds disabled");
        }
        Ok(Loader {
            tracker: Rc::new(RefCell::new(LoadTracker::new())),
            sound_format,
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.tracker.borrow().is_loaded()
    }

    pub fn sound_format(&self) -> Option<SoundFormat> {
        self.sound_format
    }

    pub fn load_image(&self, url: &str) -> Result<HtmlImageElement> {
        let image = browser::new_image()?;
        self.tracker.borrow_mut().queue();

        let (on_loaded, on_failed) = self.reporters(url);
        let success_callback = browser::closure_wrap(Box::new(on_loaded) as Box<dyn FnMut()>);
        let error_callback = browser::closure_wrap(
            Box::new(move |_err: JsValue| on_failed()) as Box<dyn FnMut(JsValue)>
        );

        image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
        image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
        image.set_src(url);

        // keep callbacks alive until the image loads or errors
        success_callback.forget();
        error_callback.forget();

        Ok(image)
    }

    pub fn load_sound(&self, url: &str) -> Result<HtmlAudioElement> {
        let Some(format) = self.sound_format else {
            bail!("Cannot load sound [{}] : no supported audio format", url);
        };
        let source = format!("{}{}", url, format.extension());
        let audio = browser::new_audio()?;
        self.tracker.borrow_mut().queue();

        let (on_loaded, on_failed) = self.reporters(&source);
        // canplaythrough can fire again after seeking, hence FnMut + guard
        let ready_callback =
            browser::closure_wrap(Box::new(on_loaded) as Box<dyn FnMut()>);
        let error_callback =
            browser::closure_wrap(Box::new(on_failed) as Box<dyn FnMut()>);

        audio
            .add_event_listener_with_callback(
                "canplaythrough",
                ready_callback.as_ref().unchecked_ref(),
            )
            .map_err(|err| anyhow!("Could not listen for canplaythrough : {:#?}", err))?;
        audio
            .add_event_listener_with_callback("error", error_callback.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for audio error : {:#?}", err))?;
        audio.set_src(&source);

        ready_callback.forget();
        error_callback.forget();

        Ok(audio)
    }

    /// Resolves once every queued asset reported, immediately when nothing
    /// is pending. Register it after queueing the assets.
    pub fn finished(&self) -> impl Future<Output = Result<LoadReport>> {
        let (tx, rx) = oneshot::channel::<LoadReport>();
        self.tracker.borrow_mut().on_complete(move |report| {
            let _ = tx.send(report);
        });
        async move {
            rx.await
                .map_err(|_| anyhow!("Loader was dropped before all assets reported"))
        }
    }

    /// One shared guard per asset: whichever of load/error arrives first is
    /// counted, later events for the same asset are ignored.
    fn reporters(&self, url: &str) -> (impl Fn() + 'static, impl Fn() + 'static) {
        let settled = Rc::new(Cell::new(false));

        let tracker = self.tracker.clone();
        let loaded_guard = settled.clone();
        let on_loaded = move || {
            if loaded_guard.replace(true) {
                return;
            }
            let progress = tracker.borrow_mut().item_loaded();
            log!("{}", progress);
        };

        let tracker = self.tracker.clone();
        let url = url.to_string();
        let on_failed = move || {
            if settled.replace(true) {
                return;
            }
            error!("Loader: could not load [{}]", url);
            tracker.borrow_mut().item_failed(url.clone());
        };

        (on_loaded, on_failed)
    }
}
