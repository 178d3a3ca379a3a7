use web_sys::Document;

use crate::animator::{Animator, Easing, Offset, Props, Tween};
use crate::dom;
use crate::viewport::ViewportMode;

/// One entrance animation: every match of `selector` animates in from `from`.
#[derive(Clone, Debug, PartialEq)]
pub struct IntroStep {
    pub selector: &'static str,
    pub from: Props,
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub stagger_ms: u32,
    pub easing: Easing,
}

pub fn intro_steps(mode: ViewportMode) -> Vec<IntroStep> {
    match mode {
        ViewportMode::Mobile | ViewportMode::Tablet => vec![
            IntroStep {
                selector: ".top-section",
                from: Props::default().opacity(0.0).y(-20.0),
                duration_ms: 600,
                delay_ms: 0,
                stagger_ms: 0,
                easing: Easing::Out,
            },
            IntroStep {
                selector: ".header-center",
                from: Props::default().opacity(0.0).scale(0.95),
                duration_ms: 500,
                delay_ms: 200,
                stagger_ms: 0,
                easing: Easing::Out,
            },
            IntroStep {
                selector: ".block-item",
                from: Props::default().opacity(0.0).y(20.0),
                duration_ms: 400,
                delay_ms: 300,
                stagger_ms: 100,
                easing: Easing::Out,
            },
        ],
        ViewportMode::Desktop => vec![
            IntroStep {
                selector: ".timer-circle",
                from: Props::default().opacity(0.0).scale(0.8).rotation(-10.0),
                duration_ms: 800,
                delay_ms: 200,
                stagger_ms: 0,
                easing: Easing::BackOut(1.7),
            },
            IntroStep {
                selector: ".header-center",
                from: Props::default().opacity(0.0).y(-20.0),
                duration_ms: 600,
                delay_ms: 100,
                stagger_ms: 0,
                easing: Easing::Out,
            },
            IntroStep {
                selector: ".block-item",
                from: Props::default().opacity(0.0).y(30.0),
                duration_ms: 500,
                delay_ms: 400,
                stagger_ms: 100,
                easing: Easing::Out,
            },
        ],
    }
}

/// The resting values matching whatever `from` touched.
fn settled(from: &Props) -> Props {
    Props {
        opacity: from.opacity.map(|_| 1.0),
        x: from.x.map(|_| Offset::Px(0.0)),
        y: from.y.map(|_| Offset::Px(0.0)),
        scale: from.scale.map(|_| 1.0),
        rotation: from.rotation.map(|_| 0.0),
        ..Props::default()
    }
}

pub fn play(document: &Document, animator: &dyn Animator, mode: ViewportMode) {
    for step in intro_steps(mode) {
        for (index, element) in dom::select_all(document, step.selector).iter().enumerate() {
            let tween = Tween::from_to(step.from.clone(), settled(&step.from))
                .duration(step.duration_ms)
                .delay(step.delay_ms + step.stagger_ms * index as u32)
                .ease(step.easing);
            animator.animate(element, tween, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_mirrors_touched_fields() {
        let from = Props::default().opacity(0.0).scale(0.8).rotation(-10.0);
        let to = settled(&from);
        assert_eq!(to.opacity, Some(1.0));
        assert_eq!(to.scale, Some(1.0));
        assert_eq!(to.rotation, Some(0.0));
        assert_eq!(to.y, None);

        let to = settled(&Props::default().y(30.0));
        assert_eq!(to.y, Some(Offset::Px(0.0)));
        assert_eq!(to.opacity, None);
    }

    #[test]
    fn desktop_leads_with_the_timer() {
        let steps = intro_steps(ViewportMode::Desktop);
        assert_eq!(steps[0].selector, ".timer-circle");
        assert_eq!(steps[2].stagger_ms, 100);
        assert_eq!(intro_steps(ViewportMode::Mobile), intro_steps(ViewportMode::Tablet));
    }
}
