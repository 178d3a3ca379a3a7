//! Countdown shown in the header circle and mirrored by the sticky header.

use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use web_sys::{Document, Element};

use crate::animator::{Animator, Easing, Props, Tween};
use crate::config::LandingConfig;
use crate::dom;

pub const EXPIRED_COLOR: &str = "#ff3333";
const TICK_MS: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerPhase {
    Running(u32),
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Ticked,
    JustExpired,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerState {
    total: u32,
    phase: TimerPhase,
}

impl TimerState {
    pub fn new(total: u32) -> Self {
        let phase = if total == 0 {
            TimerPhase::Expired
        } else {
            TimerPhase::Running(total)
        };
        Self { total, phase }
    }

    #[cfg(test)]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        match self.phase {
            TimerPhase::Running(left) => left,
            TimerPhase::Expired => 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.phase == TimerPhase::Expired
    }

    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            TimerPhase::Running(left) if left > 1 => {
                self.phase = TimerPhase::Running(left - 1);
                TickOutcome::Ticked
            }
            TimerPhase::Running(_) => {
                self.phase = TimerPhase::Expired;
                TickOutcome::JustExpired
            }
            TimerPhase::Expired => TickOutcome::Finished,
        }
    }

    pub fn formatted(&self) -> String {
        format_mmss(self.remaining())
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.remaining()) / f64::from(self.total)
    }
}

pub fn format_mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn circumference(radius: f64) -> f64 {
    2.0 * PI * radius
}

pub fn stroke_offset(circumference: f64, ratio: f64) -> f64 {
    circumference * (1.0 - ratio.clamp(0.0, 1.0))
}

/// What mirrors receive after every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TimerSnapshot {
    pub formatted: String,
    pub ratio: f64,
    pub just_expired: bool,
}

/// A single pending deferred callback, cancelled as a unit.
#[derive(Default)]
pub struct ScheduledTask {
    pending: RefCell<Option<Timeout>>,
}

impl ScheduledTask {
    pub fn schedule(&self, millis: u32, f: impl FnOnce() + 'static) {
        *self.pending.borrow_mut() = Some(Timeout::new(millis, f));
    }

    pub fn cancel(&self) {
        // Dropping a gloo Timeout clears it.
        self.pending.borrow_mut().take();
    }
}

struct ProgressRing {
    element: Element,
    circumference: f64,
}

type Mirror = Rc<dyn Fn(&TimerSnapshot)>;

struct CountdownInner {
    state: RefCell<TimerState>,
    display: Option<Element>,
    ring: Option<ProgressRing>,
    mirrors: RefCell<Vec<Mirror>>,
    task: ScheduledTask,
    started: Cell<bool>,
    animator: Rc<dyn Animator>,
}

#[derive(Clone)]
pub struct CountdownTimer {
    inner: Rc<CountdownInner>,
}

impl CountdownTimer {
    pub fn new(document: &Document, config: &LandingConfig, animator: Rc<dyn Animator>) -> Self {
        let display = dom::select_one(document, ".timer-value");
        if display.is_none() {
            warn!("Countdown display .timer-value not found, ticking without it");
        }

        let ring = dom::select_one(document, ".progress-ring-circle").map(|element| {
            let radius = element
                .get_attribute("r")
                .and_then(|r| r.trim().parse::<f64>().ok())
                .filter(|r| *r > 0.0)
                .unwrap_or(config.ring_radius);
            ProgressRing {
                element,
                circumference: circumference(radius),
            }
        });

        Self {
            inner: Rc::new(CountdownInner {
                state: RefCell::new(TimerState::new(config.countdown_seconds)),
                display,
                ring,
                mirrors: RefCell::new(Vec::new()),
                task: ScheduledTask::default(),
                started: Cell::new(false),
                animator,
            }),
        }
    }

    pub fn subscribe(&self, mirror: impl Fn(&TimerSnapshot) + 'static) {
        self.inner.mirrors.borrow_mut().push(Rc::new(mirror));
    }

    pub fn formatted(&self) -> String {
        self.inner.state.borrow().formatted()
    }

    pub fn progress_ratio(&self) -> f64 {
        self.inner.state.borrow().progress_ratio()
    }

    /// Begins ticking. Later calls do nothing.
    pub fn start(&self) {
        if self.inner.started.replace(true) {
            return;
        }
        if let Some(ring) = &self.inner.ring {
            let dasharray = ring.circumference.to_string();
            dom::set_styles(
                &ring.element,
                &[("stroke-dasharray", dasharray.as_str()), ("stroke-dashoffset", "0")],
            );
        }
        info!("Countdown started at {}", self.formatted());
        let just_expired = self.inner.state.borrow().is_expired();
        Self::render(&self.inner, just_expired);
        if !just_expired {
            Self::schedule_next(&self.inner);
        }
    }

    pub fn cancel(&self) {
        self.inner.task.cancel();
    }

    fn schedule_next(inner: &Rc<CountdownInner>) {
        let weak = Rc::downgrade(inner);
        inner.task.schedule(TICK_MS, move || {
            if let Some(inner) = weak.upgrade() {
                Self::tick(&inner);
            }
        });
    }

    fn tick(inner: &Rc<CountdownInner>) {
        let outcome = inner.state.borrow_mut().tick();
        match outcome {
            TickOutcome::Ticked => {
                Self::render(inner, false);
                Self::schedule_next(inner);
            }
            TickOutcome::JustExpired => {
                debug!("Countdown expired");
                Self::render(inner, true);
            }
            TickOutcome::Finished => {}
        }
    }

    fn render(inner: &Rc<CountdownInner>, just_expired: bool) {
        let timer = Self { inner: Rc::clone(inner) };
        let snapshot = TimerSnapshot {
            formatted: timer.formatted(),
            ratio: timer.progress_ratio(),
            just_expired,
        };

        if let Some(display) = &inner.display {
            display.set_text_content(Some(&snapshot.formatted));
            if just_expired {
                flash(inner.animator.as_ref(), display);
            }
        }

        if let Some(ring) = &inner.ring {
            let offset = stroke_offset(ring.circumference, snapshot.ratio);
            inner.animator.animate(
                &ring.element,
                Tween::to(Props::default().stroke_dashoffset(offset))
                    .duration(TICK_MS)
                    .ease(Easing::Linear),
                None,
            );
        }

        let mirrors = inner.mirrors.borrow().clone();
        for mirror in mirrors {
            mirror(&snapshot);
        }
    }
}

/// The expiry highlight: red, back and forth a fixed number of times.
pub fn flash(animator: &dyn Animator, element: &Element) {
    animator.animate(
        element,
        Tween::to(Props::default().color(EXPIRED_COLOR)).duration(300).yoyo(3),
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(k: u32) -> String {
        let left = 300 - k;
        format!("{:02}:{:02}", left / 60, left % 60)
    }

    #[test]
    fn starts_running_full() {
        let state = TimerState::new(300);
        assert_eq!(state.phase(), TimerPhase::Running(300));
        assert_eq!(state.formatted(), "05:00");
        assert_eq!(state.progress_ratio(), 1.0);
    }

    #[test]
    fn formatted_after_k_ticks() {
        let mut state = TimerState::new(300);
        for k in 1..300 {
            assert_eq!(state.tick(), TickOutcome::Ticked);
            assert_eq!(state.formatted(), expected(k), "after {} ticks", k);
        }
        assert_eq!(state.tick(), TickOutcome::JustExpired);
        assert_eq!(state.phase(), TimerPhase::Expired);
        assert_eq!(state.formatted(), "00:00");
    }

    #[test]
    fn expired_is_terminal() {
        let mut state = TimerState::new(2);
        state.tick();
        assert_eq!(state.tick(), TickOutcome::JustExpired);
        for _ in 0..5 {
            assert_eq!(state.tick(), TickOutcome::Finished);
            assert_eq!(state.formatted(), "00:00");
            assert!(state.is_expired());
        }
    }

    #[test]
    fn zero_length_timer_is_already_expired() {
        let state = TimerState::new(0);
        assert!(state.is_expired());
        assert_eq!(state.progress_ratio(), 0.0);
    }

    #[test]
    fn ratio_drives_stroke_offset() {
        let mut state = TimerState::new(300);
        for _ in 0..150 {
            state.tick();
        }
        assert!((state.progress_ratio() - 0.5).abs() < 1e-9);

        let c = circumference(71.0);
        assert!((c - 446.106).abs() < 1e-3);
        assert_eq!(stroke_offset(c, 1.0), 0.0);
        assert!((stroke_offset(c, 0.5) - c / 2.0).abs() < 1e-9);
        assert_eq!(stroke_offset(c, 0.0), c);
        assert_eq!(stroke_offset(c, 1.5), 0.0);
    }

    #[test]
    fn pads_minutes_and_seconds() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(9), "00:09");
        assert_eq!(format_mmss(61), "01:01");
        assert_eq!(format_mmss(600), "10:00");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use crate::animator::TransitionAnimator;
    use gloo_timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn ring_offset_tracks_the_progress_ratio() {
        let document = dom::document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(
            r#"<svg><circle class="progress-ring-circle" r="50"></circle></svg><span class="timer-value"></span>"#,
        );
        document.body().unwrap().append_child(&root).unwrap();

        let config = LandingConfig { countdown_seconds: 10, ..LandingConfig::default() };
        let timer = CountdownTimer::new(&document, &config, Rc::new(TransitionAnimator::new(true)));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        timer.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.ratio));

        timer.start();
        TimeoutFuture::new(1100).await;
        timer.cancel();

        assert_eq!(timer.formatted(), "00:09");
        assert!((timer.progress_ratio() - 0.9).abs() < 1e-9);
        assert_eq!(*seen.borrow(), vec![1.0, timer.progress_ratio()]);

        let ring = dom::select_one_within(&root, ".progress-ring-circle").unwrap();
        let style = dom::style_of(&ring).unwrap();
        let offset: f64 = style
            .get_property_value("stroke-dashoffset")
            .unwrap()
            .trim_end_matches("px")
            .parse()
            .unwrap();
        let expected = stroke_offset(circumference(50.0), timer.progress_ratio());
        assert!((offset - expected).abs() < 0.01, "{} vs {}", offset, expected);

        root.remove();
    }
}
