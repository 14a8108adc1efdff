use catalog::{ChapterDescriptor, StoryCatalog};
use foundation::geo::LngLat;
use foundation::ids::ChapterId;
use narrative::{
    Animation, ControllerFactories, Disposal, EffectContext, EffectController, EffectError,
    LayerKind, LayerSpec, MarkerCategory, MarkerSpec, Pane, PaneLayout,
};

/// Stand-in for a family's real visual effects: draws the family's track
/// from its chapter data once, then drops a labelled marker per trigger at
/// the family camera (one per pane while split).
pub struct TrackController {
    family: ChapterId,
    anchor: LngLat,
    drawn: bool,
}

impl TrackController {
    pub fn new(root: &ChapterDescriptor) -> Self {
        Self {
            family: root.family().clone(),
            anchor: root.camera.center,
            drawn: false,
        }
    }

    fn track_id(&self) -> String {
        format!("{}-track", self.family)
    }
}

impl Animation for TrackController {
    fn stop(&mut self) -> Disposal {
        self.drawn = false;
        Disposal::Done
    }
}

impl EffectController for TrackController {
    fn trigger(&mut self, name: &str, cx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        if !self.drawn {
            let track = self.track_id();
            let data = cx.chapter_data().clone();
            cx.add_source(&track, &data)?;
            let mut layer = LayerSpec::new(&track, &track, LayerKind::Line);
            layer.paint = serde_json::json!({ "line-color": "#e4572e", "line-width": 2 });
            cx.add_layer(&layer)?;
            self.drawn = true;
        }

        let panes: &[Pane] = match cx.layout() {
            PaneLayout::Single => &[Pane::Primary],
            PaneLayout::Split => &[Pane::Left, Pane::Right],
        };
        for &pane in panes {
            let mut marker = MarkerSpec::at(self.anchor);
            marker.class_name = format!("{}-marker", self.family);
            marker.label = Some(format!("{name} ({})", cx.chapter()));
            marker.pane = pane;
            cx.add_marker(&marker, MarkerCategory::Main)?;
        }
        Ok(())
    }
}

/// A [`TrackController`] factory for every top-level chapter.
pub fn demo_factories(catalog: &StoryCatalog) -> ControllerFactories {
    let mut factories = ControllerFactories::new();
    for chapter in catalog.chapters().filter(|c| !c.is_sub_chapter()) {
        factories.register(chapter.id.clone(), |root, _cx| {
            Ok(Box::new(TrackController::new(root)) as Box<dyn EffectController>)
        });
    }
    factories
}
