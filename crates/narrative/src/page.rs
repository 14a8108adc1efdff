use catalog::model::{ChapterDescriptor, DateRange, LegendEntry, MinimapMode, VesselInfo};
use foundation::geo::LngLat;
use foundation::ids::ChapterId;
use serde::Serialize;

/// Position of one slide relative to the active one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlidePosition {
    Active,
    Prev,
    Next,
    Hidden,
}

/// What the slide strip and its progress dots should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideView {
    pub region: ChapterId,
    pub active: usize,
    pub total: usize,
}

impl SlideView {
    pub fn position_of(&self, index: usize) -> SlidePosition {
        if index == self.active {
            SlidePosition::Active
        } else if index + 1 == self.active {
            SlidePosition::Prev
        } else if index == self.active + 1 {
            SlidePosition::Next
        } else {
            SlidePosition::Hidden
        }
    }

    pub fn positions(&self) -> Vec<SlidePosition> {
        (0..self.total).map(|i| self.position_of(i)).collect()
    }
}

/// Page chrome around the map: timeline, legend, vessel panel, minimap,
/// intro overlay, chapter card and the slide strip.
pub trait StoryPage {
    fn set_intro_overlay(&mut self, visible: bool);
    fn set_chapter_info(&mut self, chapter: &ChapterDescriptor, visible: bool);
    fn set_minimap(&mut self, mode: MinimapMode);
    fn recenter_minimap(&mut self, center: LngLat);
    fn show_vessels(&mut self, vessels: &[VesselInfo]);
    fn show_legend(&mut self, entries: &[LegendEntry]);
    fn update_timeline(&mut self, chapter: &ChapterId, range: Option<&DateRange>);
    /// `None` hides the slide strip.
    fn show_slides(&mut self, view: Option<&SlideView>);
    /// Layout changed; the scroll detector must re-measure its regions.
    fn refresh_scroll_regions(&mut self);
}

#[cfg(test)]
mod tests {
    use super::{SlidePosition, SlideView};
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_neighbours() {
        let view = SlideView {
            region: "january-slides".into(),
            active: 1,
            total: 4,
        };
        assert_eq!(
            view.positions(),
            vec![
                SlidePosition::Prev,
                SlidePosition::Active,
                SlidePosition::Next,
                SlidePosition::Hidden
            ]
        );
    }
}
