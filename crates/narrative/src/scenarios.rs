//! End-to-end engine behaviour against the recording doubles.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use catalog::StoryCatalog;
use catalog::model::{ChapterDescriptor, SlideDescriptor, SplitScreen, Story};
use foundation::geo::{CameraTarget, LngLat};
use foundation::ids::ChapterId;
use foundation::time::Millis;
use pretty_assertions::assert_eq;
use streaming::geojson::FeatureCollection;

use crate::cleanup::SweepKind;
use crate::effects::{Animation, ControllerFactories, Disposal, EffectContext, EffectController};
use crate::engine::NarrativeEngine;
use crate::error::EffectError;
use crate::events::{EngineEvent, metric};
use crate::horizontal::{InputOutcome, SlideKey};
use crate::page::SlideView;
use crate::recording::{PageCall, RecordingPage, RecordingSurface, SurfaceCall};
use crate::registry::{Category, MarkerCategory};
use crate::surface::{LayerKind, LayerSpec, MarkerSpec, OverlayKind};
use crate::transition::{Phase, ScrollDirection, TransitionClass};

type Engine = NarrativeEngine<RecordingSurface, RecordingPage>;

#[derive(Default)]
struct Log {
    triggers: RefCell<Vec<String>>,
    built: Cell<u32>,
    disposed: Cell<u32>,
    track_features: Cell<usize>,
}

impl Log {
    fn triggers(&self) -> Vec<String> {
        self.triggers.borrow().clone()
    }
}

/// Draws a track layer once and a marker per trigger, like a real chapter
/// effect would.
struct Probe {
    family: ChapterId,
    log: Rc<Log>,
    has_track: bool,
}

impl Probe {
    fn ensure_track(&mut self, cx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        if self.has_track {
            return Ok(());
        }
        let source = format!("{}-src", self.family);
        let data = cx.chapter_data().clone();
        self.log.track_features.set(data.len());
        cx.add_source(&source, &data)?;
        cx.add_layer(&LayerSpec::new(
            format!("{}-track", self.family),
            source,
            LayerKind::Line,
        ))?;
        self.has_track = true;
        Ok(())
    }
}

impl Animation for Probe {
    fn stop(&mut self) -> Disposal {
        self.log.disposed.set(self.log.disposed.get() + 1);
        Disposal::Done
    }
}

impl EffectController for Probe {
    fn trigger(&mut self, name: &str, cx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        self.log
            .triggers
            .borrow_mut()
            .push(format!("{}:{name}", self.family));
        match name {
            "fail" => return Err(EffectError::Script("scripted failure".to_string())),
            "armTimer" => {
                cx.set_timeout(2000, 7);
            }
            "pulse" => {
                cx.set_interval(100, 9);
            }
            _ => {}
        }
        self.ensure_track(cx)?;
        cx.add_marker(
            &MarkerSpec::at(LngLat::new(56.3, 26.5)),
            MarkerCategory::Main,
        )?;
        Ok(())
    }

    fn on_timer(&mut self, tag: u32, cx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        self.log
            .triggers
            .borrow_mut()
            .push(format!("{}:timer:{tag}", self.family));
        cx.add_marker(
            &MarkerSpec::at(LngLat::new(56.0, 26.0)),
            MarkerCategory::Detection,
        )?;
        Ok(())
    }
}

fn cam(lng: f64) -> CameraTarget {
    CameraTarget::new(LngLat::new(lng, 26.0), 6.0)
}

fn slide(id: &str, camera: Option<CameraTarget>, trigger: Option<&str>) -> SlideDescriptor {
    SlideDescriptor {
        id: id.to_string(),
        title: None,
        camera,
        trigger: trigger.map(str::to_string),
    }
}

fn story() -> StoryCatalog {
    let mut january_h1 = ChapterDescriptor::new("january-h1", cam(51.0)).with_parent("january");
    january_h1.sub_chapter_action = Some("pulse".to_string());
    january_h1.hide_chapter_info = true;

    let mut february = ChapterDescriptor::new("february", cam(52.0));
    february.custom_minimap_track = true;
    let mut february_h1 = ChapterDescriptor::new("february-h1", cam(52.5)).with_parent("february");
    february_h1.sub_chapter_action = Some("showCourse".to_string());
    let mut february_h2 = ChapterDescriptor::new("february-h2", cam(52.7)).with_parent("february");
    february_h2.sub_chapter_action = Some("armTimer".to_string());

    let mut march = ChapterDescriptor::new("march", cam(53.0));
    march.split_screen = Some(SplitScreen {
        left: cam(53.0),
        right: cam(54.0),
    });

    let mut slides = ChapterDescriptor::new("april-slides", cam(55.0)).with_parent("april");
    slides.slides = vec![
        slide("s0", None, Some("slideOne")),
        slide("s1", Some(cam(55.5).with_duration(600)), None),
        slide("s2", Some(cam(55.8)), Some("slideThree")),
    ];

    let mut may_slides = ChapterDescriptor::new("may-slides", cam(56.0)).with_parent("may");
    may_slides.slides = vec![slide("m0", None, None), slide("m1", Some(cam(56.5)), None)];

    Story {
        title: "Shadow fleet".to_string(),
        intro: None,
        chapters: vec![
            ChapterDescriptor::new("intro", cam(50.0)),
            ChapterDescriptor::new("january", cam(51.0)),
            january_h1,
            february,
            february_h1,
            february_h2,
            march,
            ChapterDescriptor::new("april", cam(55.0)),
            slides,
            ChapterDescriptor::new("may", cam(56.0)),
            may_slides,
        ],
        family_vessels: Default::default(),
    }
    .validate()
    .expect("valid story")
}

/// Every family but `intro` gets a probe controller.
fn engine() -> (Engine, Rc<Log>) {
    let log = Rc::new(Log::default());
    let mut factories = ControllerFactories::new();
    for family in ["january", "february", "march", "april", "may"] {
        let log = log.clone();
        factories.register(family, move |root: &ChapterDescriptor, _cx: &mut EffectContext<'_>| {
            log.built.set(log.built.get() + 1);
            Ok(Box::new(Probe {
                family: root.id.clone(),
                log: log.clone(),
                has_track: false,
            }) as Box<dyn EffectController>)
        });
    }
    let engine = NarrativeEngine::new(
        story(),
        RecordingSurface::new(),
        RecordingPage::new(),
        factories,
    );
    (engine, log)
}

fn enter(engine: &mut Engine, at: u64, chapter: &str) {
    engine.on_region_enter(Millis(at), chapter, ScrollDirection::Forward);
}

/// Enters `chapter` at `at` and lets the whole transition, safety sweep
/// included, play out.
fn settle_on(engine: &mut Engine, at: u64, chapter: &str) {
    enter(engine, at, chapter);
    engine.advance(Millis(at + 3000));
}

/// Advances in 50ms steps, the way a host frame loop would.
fn tick(engine: &mut Engine, from: u64, to: u64) {
    for t in (from..=to).step_by(50) {
        engine.advance(Millis(t));
    }
}

fn committed(engine: &Engine) -> Vec<(String, TransitionClass)> {
    engine
        .trace()
        .iter()
        .filter_map(|s| match &s.event {
            EngineEvent::TransitionCommitted { to, class, .. } => {
                Some((to.as_str().to_string(), *class))
            }
            _ => None,
        })
        .collect()
}

fn sweeps(engine: &Engine, kind: SweepKind) -> usize {
    engine
        .trace()
        .iter()
        .filter(|s| matches!(&s.event, EngineEvent::Swept(r) if r.kind == kind))
        .count()
}

fn position(calls: &[SurfaceCall], wanted: &SurfaceCall) -> usize {
    calls
        .iter()
        .position(|c| c == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not in {calls:?}"))
}

#[test]
fn burst_commits_once_to_the_last_signal() {
    let (mut e, _) = engine();
    enter(&mut e, 0, "january");
    enter(&mut e, 20, "january-h1");
    enter(&mut e, 50, "february");

    e.advance(Millis(199));
    assert!(committed(&e).is_empty());
    assert_eq!(e.state().phase(), Phase::Debouncing);

    e.advance(Millis(200));
    assert_eq!(
        committed(&e),
        vec![("february".to_string(), TransitionClass::CrossFamily)]
    );
    assert_eq!(sweeps(&e, SweepKind::Full), 1);
    assert_eq!(e.metrics().counter(metric::SIGNALS_COALESCED), 2);
    assert_eq!(e.metrics().counter(metric::TRANSITIONS_COMMITTED), 1);
}

#[test]
fn cleanup_is_issued_before_the_camera_move() {
    let (mut e, log) = engine();
    settle_on(&mut e, 0, "january");
    assert!(e.surface().has_layer("january-track"));
    e.surface_mut().clear_calls();

    enter(&mut e, 5000, "february");
    e.advance(Millis(5150));

    let calls = e.surface().calls().to_vec();
    let removed = position(&calls, &SurfaceCall::RemoveLayer("january-track".to_string()));
    let moved = calls
        .iter()
        .position(|c| matches!(c, SurfaceCall::MoveCamera { .. }))
        .expect("camera move");
    assert!(removed < moved);
    assert!(matches!(
        calls[moved],
        SurfaceCall::MoveCamera {
            duration_ms: 1000,
            ..
        }
    ));
    assert_eq!(log.disposed.get(), 1);
}

#[test]
fn controller_activates_only_after_the_camera_settles() {
    let (mut e, log) = engine();
    enter(&mut e, 0, "january");
    e.advance(Millis(1149));
    assert!(log.triggers().is_empty());
    assert!(e.state().is_transitioning());

    e.advance(Millis(1150));
    assert_eq!(log.triggers(), vec!["january:showMainView".to_string()]);
    assert!(!e.state().is_transitioning());
    assert_eq!(e.next_wake(), Some(Millis(1950)));
}

#[test]
fn same_family_move_reuses_controller_and_keeps_layers() {
    let (mut e, log) = engine();
    settle_on(&mut e, 0, "february");
    assert_eq!(log.built.get(), 1);
    e.surface_mut().clear_calls();

    settle_on(&mut e, 5000, "february-h1");

    assert_eq!(log.built.get(), 1);
    assert_eq!(
        log.triggers().last().map(String::as_str),
        Some("february:showCourse")
    );
    assert_eq!(
        committed(&e).last(),
        Some(&("february-h1".to_string(), TransitionClass::SameFamily))
    );
    assert_eq!(sweeps(&e, SweepKind::Light), 1);
    assert!(
        !e.surface()
            .calls()
            .iter()
            .any(|c| matches!(c, SurfaceCall::RemoveLayer(_)))
    );
    assert!(e.surface().has_layer("february-track"));
    assert!(e.registry().has_controller("february"));
}

#[test]
fn cross_family_move_rebuilds_and_toggles_split_panes() {
    let (mut e, log) = engine();
    settle_on(&mut e, 0, "february");
    settle_on(&mut e, 5000, "march");

    assert_eq!(log.built.get(), 2);
    assert!(!e.surface().has_layer("february-track"));
    assert!(e.surface().has_layer("march-track"));
    assert!(e.split_open());
    assert!(e.surface().is_split());
    assert!(e.page().calls().contains(&PageCall::RefreshRegions));

    settle_on(&mut e, 10_000, "april");
    assert!(!e.split_open());
    assert!(e.surface().calls().contains(&SurfaceCall::CloseSplit));
    assert!(!e.registry().has_controller("march"));
}

#[test]
fn stale_safety_sweep_removes_nothing() {
    let (mut e, _) = engine();
    enter(&mut e, 0, "february");
    e.advance(Millis(1500));
    let first = e.state().ticket();

    enter(&mut e, 1500, "february-h1");
    e.advance(Millis(1650));
    let stray = e
        .surface_mut()
        .inject_overlay(OverlayKind::Marker, Some(ChapterId::new("january")));

    e.on_safety_sweep(first);
    assert!(e.surface().has_overlay(stray));
    assert_eq!(e.metrics().counter(metric::CALLBACKS_STALE), 1);
    assert!(
        e.trace()
            .iter()
            .any(|s| matches!(s.event, EngineEvent::StaleCallback { ticket, .. } if ticket == first))
    );

    // The first transition's own sweep (due at 1950) was cancelled by the commit.
    e.advance(Millis(3449));
    assert!(e.surface().has_overlay(stray));
    assert_eq!(sweeps(&e, SweepKind::Safety), 0);

    e.advance(Millis(3450));
    assert!(!e.surface().has_overlay(stray));
    assert_eq!(sweeps(&e, SweepKind::Safety), 1);
}

#[test]
fn rapid_commits_get_an_extra_sweep_and_stop_the_camera() {
    let (mut e, _) = engine();
    enter(&mut e, 0, "january");
    e.advance(Millis(150));
    enter(&mut e, 200, "february");
    e.advance(Millis(350));

    assert_eq!(sweeps(&e, SweepKind::RapidGuard), 1);
    assert!(e.surface().calls().contains(&SurfaceCall::StopCamera));
    assert_eq!(
        committed(&e).last().map(|(to, _)| to.as_str()),
        Some("february")
    );
}

#[test]
fn returning_to_the_current_chapter_cancels_the_move() {
    let (mut e, _) = engine();
    settle_on(&mut e, 0, "january");
    enter(&mut e, 5000, "february");
    enter(&mut e, 5050, "january");
    e.advance(Millis(8000));

    assert_eq!(committed(&e).len(), 1);
    assert_eq!(e.current_chapter().map(ChapterId::as_str), Some("january"));
}

#[test]
fn repeated_signal_for_settled_chapter_is_ignored() {
    let (mut e, _) = engine();
    settle_on(&mut e, 0, "january");
    enter(&mut e, 5000, "january");
    assert_eq!(e.state().phase(), Phase::Idle);
    assert!(
        e.trace()
            .iter()
            .any(|s| matches!(s.event, EngineEvent::SignalIgnored { .. }))
    );
}

#[test]
fn unknown_chapter_leaves_state_untouched() {
    let (mut e, _) = engine();
    settle_on(&mut e, 0, "january");
    settle_on(&mut e, 5000, "atlantis");

    assert_eq!(e.current_chapter().map(ChapterId::as_str), Some("january"));
    assert!(!e.state().is_transitioning());
    assert!(
        e.trace()
            .iter()
            .any(|s| matches!(&s.event, EngineEvent::UnknownChapter { chapter } if chapter == "atlantis"))
    );
}

#[test]
fn unknown_chapter_during_camera_move_keeps_transition_in_flight() {
    let (mut e, _) = engine();
    settle_on(&mut e, 0, "january");
    // february commits at 5150; its camera settles at 6150.
    enter(&mut e, 5000, "february");
    enter(&mut e, 5200, "atlantis");
    e.advance(Millis(5400));

    assert!(
        e.trace()
            .iter()
            .any(|s| matches!(&s.event, EngineEvent::UnknownChapter { chapter } if chapter == "atlantis"))
    );
    assert!(e.state().is_transitioning());
    assert_eq!(e.state().phase(), Phase::Transitioning);

    e.advance(Millis(6200));
    assert!(!e.state().is_transitioning());
    assert_eq!(e.current_chapter().map(ChapterId::as_str), Some("february"));
}

#[test]
fn cancel_pending_transitions_drops_everything_deferred() {
    let (mut e, _) = engine();
    enter(&mut e, 0, "january");
    e.cancel_pending_transitions(Millis(50));
    e.advance(Millis(5000));

    assert!(committed(&e).is_empty());
    assert_eq!(e.state().phase(), Phase::Idle);
    assert_eq!(e.state().pending(), None);
    assert_eq!(e.next_wake(), None);
}

#[test]
fn missing_factory_is_reported_and_the_transition_completes() {
    let (mut e, _) = engine();
    settle_on(&mut e, 0, "intro");

    assert_eq!(e.metrics().counter(metric::CONTROLLERS_FAILED), 1);
    assert!(e.trace().iter().any(|s| matches!(
        &s.event,
        EngineEvent::ControllerFailed { family, .. } if family == "intro"
    )));
    assert!(!e.state().is_transitioning());
    assert!(e.page().calls().contains(&PageCall::IntroOverlay { visible: true }));
}

#[test]
fn marker_failure_is_recorded_without_aborting() {
    let (mut e, _) = engine();
    e.surface_mut().fail_overlay_creation(true);
    settle_on(&mut e, 0, "february");

    assert_eq!(
        e.registry()
            .failed_creations_of("february", Category::Marker),
        1
    );
    assert_eq!(e.metrics().counter(metric::CONTROLLERS_FAILED), 1);
    assert!(!e.state().is_transitioning());
    assert!(e.registry().has_controller("february"));
}

#[test]
fn effect_timer_firing_after_chapter_change_fails_softly() {
    let (mut e, log) = engine();
    enter(&mut e, 0, "february-h2");
    e.advance(Millis(1150));
    assert_eq!(
        log.triggers(),
        vec!["february:armTimer".to_string()]
    );
    assert_eq!(e.registry().count(Category::Timer), 1);

    // Same family: the light sweep keeps the pending timer.
    enter(&mut e, 1500, "february-h1");
    e.advance(Millis(2700));
    assert_eq!(log.triggers().last().map(String::as_str), Some("february:showCourse"));
    e.surface_mut().fail_overlay_creation(true);
    e.advance(Millis(3150));

    assert!(log.triggers().contains(&"february:timer:7".to_string()));
    assert_eq!(
        e.registry()
            .failed_creations_of("february", Category::Marker),
        1
    );
    assert_eq!(e.registry().count(Category::Timer), 0);
}

#[test]
fn full_sweep_cancels_effect_intervals() {
    let (mut e, log) = engine();
    enter(&mut e, 0, "january-h1");
    tick(&mut e, 0, 1450);
    assert_eq!(pulses(&log), 3);

    // One more pulse at 1550 before the commit at 1610 cancels the interval.
    enter(&mut e, 1460, "february");
    tick(&mut e, 1460, 1700);
    e.advance(Millis(5000));
    assert_eq!(pulses(&log), 4);
    assert_eq!(e.registry().count(Category::Interval), 0);
}

fn pulses(log: &Log) -> usize {
    log.triggers()
        .iter()
        .filter(|t| t.as_str() == "january:timer:9")
        .count()
}

#[test]
fn host_stall_does_not_replay_missed_interval_ticks() {
    let (mut e, log) = engine();
    enter(&mut e, 0, "january-h1");
    tick(&mut e, 0, 1450);
    assert_eq!(pulses(&log), 3);

    e.advance(Millis(61_450));
    assert_eq!(pulses(&log), 4);
    assert_eq!(e.next_wake(), Some(Millis(61_550)));
}

#[test]
fn page_chrome_follows_the_chapter() {
    let (mut e, _) = engine();
    settle_on(&mut e, 0, "january-h1");
    let calls = e.page().calls().to_vec();
    assert!(calls.contains(&PageCall::IntroOverlay { visible: false }));
    assert!(calls.contains(&PageCall::ChapterInfo {
        chapter: "january-h1".into(),
        visible: false
    }));
    assert!(calls.contains(&PageCall::MinimapCenter {
        center: LngLat::new(51.0, 26.0)
    }));

    e.page_mut().clear_calls();
    settle_on(&mut e, 5000, "february");
    assert!(
        !e.page()
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::MinimapCenter { .. }))
    );
}

#[test]
fn chapter_data_reaches_effects() {
    let (mut e, log) = engine();
    let track = FeatureCollection::new(vec![serde_json::json!({"type": "Feature"})]);
    e.provide_chapter_data("february", std::sync::Arc::new(track));
    settle_on(&mut e, 0, "february-h1");
    assert!(e.surface().has_source("february-src"));
    assert_eq!(log.track_features.get(), 1);
}

#[test]
fn shutdown_leaves_a_clean_map() {
    let (mut e, _) = engine();
    e.surface_mut().add_base_layer("water");
    settle_on(&mut e, 0, "march");
    let report = e.shutdown(Millis(5000));

    assert!(report.panes_closed);
    assert!(e.registry().is_empty());
    assert_eq!(e.surface().overlay_count(), 0);
    assert_eq!(e.surface().layer_ids(), vec!["water".to_string()]);
    assert_eq!(e.current_chapter(), None);
}

mod slides {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slide_index(e: &Engine) -> Option<usize> {
        e.slides().index()
    }

    #[test]
    fn forward_entry_starts_at_first_slide_and_wheel_steps_once() {
        let (mut e, log) = engine();
        settle_on(&mut e, 0, "april");
        enter(&mut e, 5000, "april-slides");

        // No debounce for slide regions.
        assert_eq!(slide_index(&e), Some(0));
        assert_eq!(sweeps(&e, SweepKind::Full), 2);
        assert_eq!(
            e.page().last_slides(),
            Some(&Some(SlideView {
                region: "april-slides".into(),
                active: 0,
                total: 3
            }))
        );

        e.advance(Millis(6000));
        assert_eq!(log.triggers().last().map(String::as_str), Some("april:slideOne"));

        assert_eq!(e.on_wheel(Millis(6100), 120.0), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(1));
        assert_eq!(e.on_wheel(Millis(6200), 120.0), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(1));

        assert_eq!(e.on_wheel(Millis(6600), 60.0), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(1));
        assert_eq!(e.on_wheel(Millis(6650), 60.0), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(2));
        assert_eq!(
            log.triggers().last().map(String::as_str),
            Some("april:slideThree")
        );
        assert!(e.surface().calls().contains(&SurfaceCall::MoveCamera {
            pane: crate::surface::Pane::Primary,
            center: LngLat::new(55.8, 26.0),
            zoom: 6.0,
            duration_ms: 400,
        }));

        assert_eq!(e.on_wheel(Millis(7100), 120.0), InputOutcome::PassThrough);
        assert!(!e.slides().is_active());
        assert_eq!(
            committed(&e).last().map(|(to, _)| to.as_str()),
            Some("may")
        );
    }

    #[test]
    fn backward_entry_starts_at_last_slide_and_exits_to_parent() {
        let (mut e, log) = engine();
        settle_on(&mut e, 0, "may");
        e.on_region_enter(Millis(5000), "april-slides", ScrollDirection::Backward);
        assert_eq!(slide_index(&e), Some(2));

        assert_eq!(e.on_key(Millis(5100), SlideKey::Previous), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(1));
        assert_eq!(e.on_key(Millis(5200), SlideKey::Previous), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(1));
        e.on_key(Millis(5600), SlideKey::Previous);
        assert_eq!(slide_index(&e), Some(0));

        assert_eq!(
            e.on_key(Millis(6100), SlideKey::Previous),
            InputOutcome::PassThrough
        );
        assert!(!e.slides().is_active());
        assert_eq!(
            committed(&e).last(),
            Some(&("april".to_string(), TransitionClass::CrossFamily))
        );

        e.advance(Millis(9000));
        let triggers = log.triggers();
        assert_eq!(triggers.last().map(String::as_str), Some("april:showMainView"));
        assert!(!triggers.contains(&"april:slideThree".to_string()));
    }

    #[test]
    fn re_entering_from_below_after_a_detector_exit_starts_at_last_slide() {
        let (mut e, _) = engine();
        settle_on(&mut e, 0, "april");
        enter(&mut e, 5000, "april-slides");
        e.on_key(Millis(6000), SlideKey::Next);
        e.on_key(Millis(6500), SlideKey::Next);
        assert_eq!(slide_index(&e), Some(2));

        e.on_region_exit(Millis(7000), "april-slides", ScrollDirection::Forward);
        assert!(!e.slides().is_active());
        e.on_region_enter(Millis(7050), "april-slides", ScrollDirection::Backward);
        assert_eq!(slide_index(&e), Some(2));
    }

    #[test]
    fn entering_another_region_starts_with_fresh_input_state() {
        let (mut e, _) = engine();
        settle_on(&mut e, 0, "april");
        enter(&mut e, 5000, "april-slides");
        assert_eq!(e.on_key(Millis(6000), SlideKey::Next), InputOutcome::Consumed);
        assert!(e.slides().is_locked());

        enter(&mut e, 6050, "may-slides");
        assert_eq!(e.slides().region().map(ChapterId::as_str), Some("may-slides"));
        assert!(!e.slides().is_locked());
        assert!(e.trace().iter().any(|s| matches!(
            &s.event,
            EngineEvent::SlidesReleased { region } if region == "april-slides"
        )));

        assert_eq!(e.on_key(Millis(6100), SlideKey::Next), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(1));
    }

    #[test]
    fn swipes_and_dots() {
        let (mut e, _) = engine();
        settle_on(&mut e, 0, "april");
        enter(&mut e, 5000, "april-slides");

        e.on_touch_start(Millis(5100), 200.0, 10.0);
        assert_eq!(e.on_touch_end(Millis(5150), 170.0, 12.0), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(0));

        e.on_touch_start(Millis(5200), 200.0, 10.0);
        e.on_touch_end(Millis(5250), 120.0, 14.0);
        assert_eq!(slide_index(&e), Some(1));

        assert_eq!(e.on_dot_click(Millis(5300), 0), InputOutcome::Consumed);
        assert_eq!(slide_index(&e), Some(1));
        e.on_dot_click(Millis(5700), 0);
        assert_eq!(slide_index(&e), Some(0));
        e.on_dot_click(Millis(6200), 2);
        assert_eq!(slide_index(&e), Some(2));
    }

    #[test]
    fn input_outside_a_region_passes_through() {
        let (mut e, _) = engine();
        settle_on(&mut e, 0, "april");
        assert_eq!(e.on_wheel(Millis(4000), 500.0), InputOutcome::PassThrough);
        assert_eq!(e.on_key(Millis(4000), SlideKey::Next), InputOutcome::PassThrough);
    }

    #[test]
    fn leaving_the_region_through_the_detector_releases_it() {
        let (mut e, _) = engine();
        settle_on(&mut e, 0, "april");
        enter(&mut e, 5000, "april-slides");
        e.on_region_exit(Millis(5500), "april-slides", ScrollDirection::Forward);

        assert!(!e.slides().is_active());
        assert_eq!(e.page().last_slides(), Some(&None));
        assert_eq!(e.on_wheel(Millis(5600), 200.0), InputOutcome::PassThrough);
    }
}
