use crate::browser;
use anyhow::{anyhow, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use self::input::MouseState;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, mouse: &MouseState);
    fn draw(&self, renderer: &Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

thread_local! {
    // bumped by every LoopTicket::claim and GameLoop::stop
    static LOOP_GENERATION: Cell<u64> = const { Cell::new(0) };
}

/// Right to run the game loop. Claiming a ticket (or stopping) retires
/// every earlier one, so only the most recent start keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTicket(u64);

impl LoopTicket {
    pub fn claim() -> Self {
        LOOP_GENERATION.with(|g| {
            g.set(g.get() + 1);
            LoopTicket(g.get())
        })
    }

    pub fn is_current(&self) -> bool {
        LOOP_GENERATION.with(|g| g.get() == self.0)
    }
}

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

/// ┌──────────────────── One Animation Frame ─────────────────────┐
/// │  ticket retired?  →  free the loop, stop                     │
/// │  drain pointer events  →  MouseState                         │
/// │  while accumulated > FRAME_SIZE  →  game.update(&mouse)      │
/// │  game.draw(&renderer)                                        │
/// │  request next frame                                          │
/// └──────────────────────────────────────────────────────────────┘
impl GameLoop {
    /// Initializes `game` and runs it until `ticket` is retired. Returns
    /// quietly without starting when the ticket is already stale.
    pub async fn start(
        game: impl Game + 'static,
        canvas_id: &str,
        ticket: LoopTicket,
    ) -> Result<()> {
        let mut pointer = input::PointerInput::attach(&browser::canvas(canvas_id)?)?;
        let mut game = game.initialize().await?;
        if !ticket.is_current() {
            return Ok(());
        }
        let mut mouse = MouseState::default();
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context(canvas_id)?,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            if !ticket.is_current() {
                pointer.detach();
                // the closure cannot drop itself while running, release it
                // (and the game it owns) once this frame is over
                let retired = f.clone();
                browser::spawn_local(async move {
                    retired.borrow_mut().take();
                });
                return;
            }
            pointer.process(&mut mouse);
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&mouse);
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);

            if let Some(next) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next) {
                    error!("GameLoop: {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }

    /// Retires whichever loop is running, it frees itself on its next frame
    pub fn stop() {
        LOOP_GENERATION.with(|g| g.set(g.get() + 1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x, rect.y, rect.width, rect.height);
    }

    /// Copies the `frame` section of `image` into `destination`
    pub fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x,
                frame.y,
                frame.width,
                frame.height,
                destination.x,
                destination.y,
                destination.width,
                destination.height,
            )
        {
            error!("Renderer: draw_image failed : {:#?}", err);
        }
    }

    pub fn draw_entire_image(&self, image: &HtmlImageElement, position: &Point) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element(image, position.x, position.y)
        {
            error!("Renderer: draw_entire_image failed : {:#?}", err);
        }
    }

    pub fn draw_text(&self, text: &str, position: &Point) {
        self.context.set_font("16pt serif");
        self.context.set_fill_style_str("white");
        if let Err(err) = self.context.fill_text(text, position.x, position.y) {
            error!("Renderer: draw_text failed : {:#?}", err);
        }
    }
}

pub mod input {
    use crate::browser;
    use anyhow::{anyhow, Result};
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{HtmlCanvasElement, MouseEvent};

    /// Canvas pointer events, coordinates relative to the canvas
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum PointerEvent {
        Move { x: f64, y: f64 },
        Down,
        Up,
        Out,
    }

    /// Last known pointer position plus where the current press started
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct MouseState {
        pub x: f64,
        pub y: f64,
        pub down_x: f64,
        pub down_y: f64,
        pub down: bool,
        pub dragging: bool,
    }

    impl MouseState {
        pub fn apply(&mut self, event: PointerEvent) {
            match event {
                PointerEvent::Move { x, y } => {
                    self.x = x;
                    self.y = y;
                    if self.down {
                        self.dragging = true;
                    }
                }
                PointerEvent::Down => {
                    self.down = true;
                    self.down_x = self.x;
                    self.down_y = self.y;
                }
                // leaving the canvas ends the press just like releasing it
                PointerEvent::Up | PointerEvent::Out => {
                    self.down = false;
                    self.dragging = false;
                }
            }
        }
    }

    type Listener = Closure<dyn FnMut(MouseEvent)>;

    /// Canvas mouse listeners feeding a queue that is drained once per frame.
    /// Detaching (or dropping) removes the listeners and closes the queue.
    pub struct PointerInput {
        canvas: HtmlCanvasElement,
        listeners: Vec<(&'static str, Listener)>,
        receiver: UnboundedReceiver<PointerEvent>,
    }

    impl PointerInput {
        pub fn attach(canvas: &HtmlCanvasElement) -> Result<Self> {
            let (sender, receiver) = unbounded();
            let sender = Rc::new(RefCell::new(sender));

            let mappings: [(&'static str, fn(&MouseEvent) -> PointerEvent); 4] = [
                ("mousemove", |ev| PointerEvent::Move {
                    x: ev.offset_x().into(),
                    y: ev.offset_y().into(),
                }),
                ("mousedown", |ev| {
                    // keeps the browser from starting a text/image drag
                    ev.prevent_default();
                    PointerEvent::Down
                }),
                ("mouseup", |_| PointerEvent::Up),
                ("mouseout", |_| PointerEvent::Out),
            ];

            let mut input = PointerInput {
                canvas: canvas.clone(),
                listeners: Vec::with_capacity(mappings.len()),
                receiver,
            };
            for (name, to_event) in mappings {
                let sender = sender.clone();
                let callback = browser::closure_wrap(Box::new(move |ev: MouseEvent| {
                    // a closed receiver only means the loop is gone
                    let _ = sender.borrow_mut().start_send(to_event(&ev));
                }) as Box<dyn FnMut(MouseEvent)>);
                canvas
                    .add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
                    .map_err(|err| anyhow!("Could not listen for {} : {:#?}", name, err))?;
                // pushed right away so an error on a later one still detaches it
                input.listeners.push((name, callback));
            }

            Ok(input)
        }

        pub fn process(&mut self, state: &mut MouseState) {
            drain(state, &mut self.receiver);
        }

        pub fn detach(&mut self) {
            for (name, callback) in self.listeners.drain(..) {
                if let Err(err) = self
                    .canvas
                    .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
                {
                    error!("PointerInput: could not remove {} listener : {:#?}", name, err);
                }
            }
            self.receiver.close();
        }
    }

    impl Drop for PointerInput {
        fn drop(&mut self) {
            self.detach();
        }
    }

    pub fn drain(state: &mut MouseState, receiver: &mut UnboundedReceiver<PointerEvent>) {
        while let Ok(event) = receiver.try_recv() {
            state.apply(event);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use approx::assert_relative_eq;

        #[test]
        fn move_without_press_is_not_a_drag() {
            let mut mouse = MouseState::default();
            mouse.apply(PointerEvent::Move { x: 40.0, y: 25.0 });
            assert_relative_eq!(mouse.x, 40.0);
            assert_relative_eq!(mouse.y, 25.0);
            assert!(!mouse.dragging);
        }

        #[test]
        fn press_records_origin_and_move_starts_drag() {
            let mut mouse = MouseState::default();
            mouse.apply(PointerEvent::Move { x: 150.0, y: 300.0 });
            mouse.apply(PointerEvent::Down);
            assert!(mouse.down);
            assert!(!mouse.dragging);
            assert_relative_eq!(mouse.down_x, 150.0);
            assert_relative_eq!(mouse.down_y, 300.0);

            mouse.apply(PointerEvent::Move { x: 120.0, y: 310.0 });
            assert!(mouse.dragging);
            assert_relative_eq!(mouse.down_x, 150.0);
        }

        #[test]
        fn release_and_leave_clear_both_flags() {
            for end in [PointerEvent::Up, PointerEvent::Out] {
                let mut mouse = MouseState::default();
                mouse.apply(PointerEvent::Down);
                mouse.apply(PointerEvent::Move { x: 1.0, y: 1.0 });
                mouse.apply(end);
                assert!(!mouse.down);
                assert!(!mouse.dragging);
            }
        }

        #[test]
        fn drain_applies_queued_events_in_order() {
            let (mut sender, mut receiver) = unbounded();
            sender.start_send(PointerEvent::Move { x: 10.0, y: 10.0 }).unwrap();
            sender.start_send(PointerEvent::Down).unwrap();
            sender.start_send(PointerEvent::Move { x: 20.0, y: 12.0 }).unwrap();

            let mut mouse = MouseState::default();
            drain(&mut mouse, &mut receiver);
            assert!(mouse.dragging);
            assert_relative_eq!(mouse.x, 20.0);
            assert_relative_eq!(mouse.down_x, 10.0);

            // nothing pending: state untouched
            drain(&mut mouse, &mut receiver);
            assert_relative_eq!(mouse.x, 20.0);
        }

        #[test]
        fn closed_queue_rejects_late_events() {
            let (mut sender, mut receiver) = unbounded();
            receiver.close();
            assert!(sender.start_send(PointerEvent::Down).is_err());

            let mut mouse = MouseState::default();
            drain(&mut mouse, &mut receiver);
            assert!(!mouse.down);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ticket_is_current() {
        let ticket = LoopTicket::claim();
        assert!(ticket.is_current());
    }

    #[test]
    fn newer_start_retires_earlier_ticket() {
        let first = LoopTicket::claim();
        let second = LoopTicket::claim();
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn stop_retires_running_ticket() {
        let ticket = LoopTicket::claim();
        GameLoop::stop();
        assert!(!ticket.is_current());
    }

    #[test]
    fn restart_after_stop_only_revives_the_new_ticket() {
        let stopped = LoopTicket::claim();
        GameLoop::stop();
        let restarted = LoopTicket::claim();
        assert!(!stopped.is_current());
        assert!(restarted.is_current());
    }
}
