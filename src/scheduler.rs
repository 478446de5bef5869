use std::collections::BTreeMap;

use crate::binding::{LayerBinding, TargetWrite};
use crate::error::{StrataError, StrataResult};
use crate::progress::{ProgressSample, ScrollState};
use crate::region::TriggerRegion;
use crate::stage::{PropertySink, Stage};

/// Per-tick accounting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Whether region boundaries were re-derived this tick.
    pub boundaries_recomputed: bool,
    /// Scroll events coalesced into this tick (listener requests since the
    /// previous tick).
    pub scroll_events_coalesced: u32,
    /// Regions that produced a progress sample.
    pub regions_sampled: usize,
    /// Bindings whose property values were computed.
    pub bindings_applied: usize,
    /// Writes handed to the sink in this tick's batch.
    pub writes_flushed: usize,
}

/// The per-frame driver.
///
/// Owns the scroll state and the region/binding registries; nothing else
/// mutates them. The host wires its event sources to [`Engine::on_scroll`] /
/// [`Engine::on_resize`] (cheap flag updates) and invokes [`Engine::tick`]
/// from its frame-scheduling primitive, so however many scroll events land
/// between frames, there is exactly one recompute and one batched write pass
/// per rendered frame.
#[derive(Debug, Default)]
pub struct Engine {
    scroll: ScrollState,
    regions: BTreeMap<String, TriggerRegion>,
    bindings: BTreeMap<String, LayerBinding>,

    samples: BTreeMap<String, ProgressSample>,
    batch: Vec<TargetWrite>,

    layout_dirty: bool,
    pending_scroll_events: u32,
    started: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the engine once the host's structure is fully available:
    /// seeds the scroll state from the current position and schedules a
    /// boundary derivation for the next tick.
    pub fn start(&mut self, stage: &dyn Stage) -> StrataResult<()> {
        if self.started {
            return Err(StrataError::registration("engine is already started"));
        }
        self.started = true;
        self.scroll = ScrollState::init(stage.scroll_offset());
        self.layout_dirty = true;
        Ok(())
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    pub fn region(&self, id: &str) -> Option<&TriggerRegion> {
        self.regions.get(id)
    }

    pub fn register_region(&mut self, region: TriggerRegion) -> StrataResult<()> {
        region.validate()?;
        if self.regions.contains_key(&region.id) {
            return Err(StrataError::registration(format!(
                "region \"{}\" is already registered",
                region.id
            )));
        }
        // Measure before the next progress computation.
        self.layout_dirty = true;
        self.regions.insert(region.id.clone(), region);
        Ok(())
    }

    /// Remove a region. Takes effect no later than the next tick; bindings
    /// still referencing it simply stop producing writes.
    pub fn unregister_region(&mut self, id: &str) -> bool {
        self.regions.remove(id).is_some()
    }

    /// Register a binding under a stable id. Fails fast on duplicate ids,
    /// invalid rule constants or a reference to an unknown region — a
    /// misconfigured layer should surface at registration, not as a missing
    /// write at runtime.
    pub fn register_binding(
        &mut self,
        id: impl Into<String>,
        binding: LayerBinding,
    ) -> StrataResult<()> {
        let id = id.into();
        binding.validate()?;
        if self.bindings.contains_key(&id) {
            return Err(StrataError::registration(format!(
                "binding \"{id}\" is already registered"
            )));
        }
        if let Some(region) = binding.region()
            && !self.regions.contains_key(region)
        {
            return Err(StrataError::registration(format!(
                "binding \"{id}\" references unknown region \"{region}\""
            )));
        }
        self.bindings.insert(id, binding);
        Ok(())
    }

    /// Remove a binding. Takes effect no later than the next tick: the
    /// removed render target is neither written to nor read from afterwards.
    pub fn unregister_binding(&mut self, id: &str) -> bool {
        self.bindings.remove(id).is_some()
    }

    /// Scroll listener hook: request a recompute. Any number of calls
    /// between frames coalesce into the next tick.
    pub fn on_scroll(&mut self) {
        self.pending_scroll_events = self.pending_scroll_events.saturating_add(1);
    }

    /// Resize listener hook: all region boundaries are re-derived before the
    /// next tick's progress computation.
    pub fn on_resize(&mut self) {
        self.layout_dirty = true;
    }

    /// One evaluation cycle, bound to at most one display refresh.
    ///
    /// Order is load-bearing: boundaries are recomputed first (stale
    /// boundaries after a resize desync every dependent layer), then the
    /// scroll state advances exactly once, then every region samples against
    /// that one consistent offset, then bindings compute, and finally the
    /// whole batch is flushed in a single call — reads never interleave with
    /// writes.
    #[tracing::instrument(skip(self, stage, sink))]
    pub fn tick(
        &mut self,
        stage: &dyn Stage,
        sink: &mut dyn PropertySink,
        elapsed_secs: f64,
    ) -> TickStats {
        let boundaries_recomputed = self.layout_dirty;
        if self.layout_dirty {
            let viewport_height = stage.viewport_height();
            for region in self.regions.values_mut() {
                match stage.anchor_rect(&region.anchor) {
                    Some(rect) => region.recompute(rect, viewport_height),
                    None => {
                        tracing::warn!(region = %region.id, anchor = %region.anchor,
                            "anchor not measurable; region degenerates");
                        region.collapse();
                    }
                }
            }
            self.layout_dirty = false;
        }

        self.scroll.advance(stage.scroll_offset());
        let scroll_events_coalesced = self.pending_scroll_events;
        self.pending_scroll_events = 0;

        self.samples.clear();
        for (id, region) in self.regions.iter_mut() {
            self.samples.insert(id.clone(), region.sample(&self.scroll));
        }

        self.batch.clear();
        let mut bindings_applied = 0usize;
        for (id, binding) in &self.bindings {
            if binding.is_ambient() {
                binding.apply_elapsed(elapsed_secs, &mut self.batch);
                bindings_applied += 1;
                continue;
            }

            let Some(sample) = binding.region().and_then(|r| self.samples.get(r)) else {
                tracing::trace!(binding = %id, "region missing; binding skipped");
                continue;
            };
            let media = if binding.needs_media() {
                stage.media_duration_secs(&binding.layer)
            } else {
                None
            };
            binding.apply_progress(*sample, media, &mut self.batch);
            bindings_applied += 1;
        }

        sink.flush(&self.batch);

        TickStats {
            boundaries_recomputed,
            scroll_events_coalesced,
            regions_sampled: self.samples.len(),
            bindings_applied,
            writes_flushed: self.batch.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::PropWrite;
    use crate::ease::Ease;
    use crate::policy::{NumericProp, PropertyRule, Rule, VideoScrubPolicy};
    use crate::region::{AnchorEdge, BoundarySpec, Rect};
    use crate::stage::{MemorySink, ResolvedStroke};
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct TestStage {
        offset: Cell<f64>,
        viewport: Cell<f64>,
        anchors: RefCell<BTreeMap<String, Rect>>,
        media: RefCell<BTreeMap<String, f64>>,
        media_reads: RefCell<BTreeMap<String, u32>>,
    }

    impl TestStage {
        fn new(viewport: f64) -> Self {
            let s = Self::default();
            s.viewport.set(viewport);
            s
        }

        fn set_anchor(&self, id: &str, y0: f64, y1: f64) {
            self.anchors
                .borrow_mut()
                .insert(id.to_owned(), Rect::new(0.0, y0, 0.0, y1));
        }
    }

    impl Stage for TestStage {
        fn scroll_offset(&self) -> f64 {
            self.offset.get()
        }

        fn viewport_height(&self) -> f64 {
            self.viewport.get()
        }

        fn anchor_rect(&self, anchor: &str) -> Option<Rect> {
            self.anchors.borrow().get(anchor).copied()
        }

        fn target_exists(&self, _layer: &str) -> bool {
            true
        }

        fn resolved_stroke(&self, _layer: &str) -> Option<ResolvedStroke> {
            None
        }

        fn media_duration_secs(&self, layer: &str) -> Option<f64> {
            *self
                .media_reads
                .borrow_mut()
                .entry(layer.to_owned())
                .or_insert(0) += 1;
            self.media.borrow().get(layer).copied()
        }
    }

    // Region spanning exactly the anchor's own offsets: start when the
    // anchor top hits the viewport top, end when its bottom does.
    fn exact_region(id: &str, anchor: &str) -> TriggerRegion {
        TriggerRegion::new(
            id,
            anchor,
            BoundarySpec::new(AnchorEdge::Top, 0.0),
            BoundarySpec::new(AnchorEdge::Bottom, 0.0),
        )
    }

    fn parallax_binding(layer: &str, region: &str, speed: f64, base: f64) -> LayerBinding {
        LayerBinding::scroll(
            layer,
            region,
            speed,
            Ease::Linear,
            vec![PropertyRule {
                prop: NumericProp::OffsetYPercent,
                rule: Rule::Scaled { base },
            }],
        )
    }

    #[test]
    fn speed_multiplier_sweeps_the_full_range() {
        let stage = TestStage::new(800.0);
        stage.set_anchor("section", 1000.0, 2000.0);

        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        engine
            .register_region(exact_region("span", "section"))
            .unwrap();
        engine
            .register_binding("bg", parallax_binding("bg", "span", 2.0, -30.0))
            .unwrap();

        let mut sink = MemorySink::new();
        stage.offset.set(1500.0);
        engine.tick(&stage, &mut sink, 0.0);
        assert_eq!(
            sink.last_batch()[0].write,
            PropWrite::OffsetYPercent(-30.0)
        );

        stage.offset.set(2000.0);
        engine.tick(&stage, &mut sink, 0.0);
        assert_eq!(
            sink.last_batch()[0].write,
            PropWrite::OffsetYPercent(-60.0)
        );
    }

    #[test]
    fn many_scroll_events_coalesce_into_one_batch_using_the_last_offset() {
        let stage = TestStage::new(800.0);
        stage.set_anchor("section", 0.0, 1000.0);

        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        engine
            .register_region(exact_region("span", "section"))
            .unwrap();
        engine
            .register_binding("bg", parallax_binding("bg", "span", 1.0, -100.0))
            .unwrap();

        let mut sink = MemorySink::new();
        for offset in [100.0, 230.0, 410.0, 480.0, 500.0] {
            stage.offset.set(offset);
            engine.on_scroll();
        }
        let stats = engine.tick(&stage, &mut sink, 0.0);

        assert_eq!(sink.batches.len(), 1);
        assert_eq!(stats.scroll_events_coalesced, 5);
        // Only the final offset (500 of 1000 -> progress 0.5) is observable.
        assert_eq!(
            sink.last_batch()[0].write,
            PropWrite::OffsetYPercent(-50.0)
        );
    }

    #[test]
    fn resize_recomputes_boundaries_before_the_next_progress_computation() {
        let stage = TestStage::new(1000.0);
        stage.set_anchor("section", 1000.0, 2000.0);

        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        engine
            .register_region(TriggerRegion::new(
                "span",
                "section",
                BoundarySpec::new(AnchorEdge::Top, 1.0),
                BoundarySpec::new(AnchorEdge::Bottom, 0.0),
            ))
            .unwrap();
        engine
            .register_binding("bg", parallax_binding("bg", "span", 1.0, -100.0))
            .unwrap();

        let mut sink = MemorySink::new();
        // Boundaries with the 1000px viewport: start 0, end 2000.
        stage.offset.set(1000.0);
        let stats = engine.tick(&stage, &mut sink, 0.0);
        assert!(stats.boundaries_recomputed);
        assert_eq!(
            sink.last_batch()[0].write,
            PropWrite::OffsetYPercent(-50.0)
        );

        // Reflow: the anchor moves and the viewport shrinks to 500px, so the
        // same offset now means start 500, end 2000 -> progress 1/3.
        stage.viewport.set(500.0);
        stage.set_anchor("section", 1000.0, 2000.0);
        engine.on_resize();
        let stats = engine.tick(&stage, &mut sink, 0.0);
        assert!(stats.boundaries_recomputed);
        let PropWrite::OffsetYPercent(v) = sink.last_batch()[0].write else {
            panic!("expected offset write");
        };
        assert!((v - (-100.0 / 3.0)).abs() < 1e-9);

        // No further layout events: boundaries stay put.
        let stats = engine.tick(&stage, &mut sink, 0.0);
        assert!(!stats.boundaries_recomputed);
    }

    #[test]
    fn unregistered_binding_is_neither_written_nor_read_next_tick() {
        let stage = TestStage::new(800.0);
        stage.set_anchor("section", 0.0, 1000.0);
        stage.media.borrow_mut().insert("video".to_owned(), 30.0);

        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        engine
            .register_region(exact_region("span", "section"))
            .unwrap();
        engine
            .register_binding(
                "video",
                LayerBinding::video_scrub(
                    "video",
                    &VideoScrubPolicy {
                        region: "span".to_owned(),
                    },
                ),
            )
            .unwrap();

        let mut sink = MemorySink::new();
        stage.offset.set(500.0);
        engine.tick(&stage, &mut sink, 0.0);
        assert!(!sink.last_batch().is_empty());
        assert_eq!(stage.media_reads.borrow()["video"], 1);

        assert!(engine.unregister_binding("video"));
        engine.tick(&stage, &mut sink, 0.0);
        assert!(sink.last_batch().is_empty());
        // No geometry/media read for the removed target either.
        assert_eq!(stage.media_reads.borrow()["video"], 1);
    }

    #[test]
    fn unregistering_a_region_silences_its_bindings_without_error() {
        let stage = TestStage::new(800.0);
        stage.set_anchor("section", 0.0, 1000.0);

        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        engine
            .register_region(exact_region("span", "section"))
            .unwrap();
        engine
            .register_binding("bg", parallax_binding("bg", "span", 1.0, -100.0))
            .unwrap();

        let mut sink = MemorySink::new();
        stage.offset.set(500.0);
        let stats = engine.tick(&stage, &mut sink, 0.0);
        assert_eq!(stats.bindings_applied, 1);

        assert!(engine.unregister_region("span"));
        let stats = engine.tick(&stage, &mut sink, 0.0);
        assert_eq!(stats.bindings_applied, 0);
        assert!(sink.last_batch().is_empty());
    }

    #[test]
    fn ambient_bindings_animate_without_any_region() {
        let stage = TestStage::new(800.0);
        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        engine
            .register_binding(
                "float",
                LayerBinding::ambient(
                    "float",
                    vec![crate::policy::AmbientRule {
                        prop: NumericProp::OffsetYPx,
                        from: 0.0,
                        to: -30.0,
                        duration_secs: 3.0,
                        ease: Ease::Linear,
                    }],
                ),
            )
            .unwrap();

        let mut sink = MemorySink::new();
        engine.tick(&stage, &mut sink, 1.5);
        assert_eq!(sink.last_batch()[0].write, PropWrite::OffsetYPx(-15.0));
        engine.tick(&stage, &mut sink, 3.0);
        assert_eq!(sink.last_batch()[0].write, PropWrite::OffsetYPx(-30.0));
    }

    #[test]
    fn registration_fails_fast_on_unknown_region_and_duplicates() {
        let stage = TestStage::new(800.0);
        let mut engine = Engine::new();
        engine.start(&stage).unwrap();

        let err = engine
            .register_binding("bg", parallax_binding("bg", "nowhere", 1.0, -30.0))
            .unwrap_err();
        assert!(err.to_string().contains("unknown region"));

        stage.set_anchor("section", 0.0, 100.0);
        engine
            .register_region(exact_region("span", "section"))
            .unwrap();
        engine
            .register_binding("bg", parallax_binding("bg", "span", 1.0, -30.0))
            .unwrap();
        let err = engine
            .register_binding("bg", parallax_binding("bg", "span", 1.0, -30.0))
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));

        let err = engine
            .register_region(exact_region("span", "section"))
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn engine_starts_exactly_once() {
        let stage = TestStage::new(800.0);
        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        assert!(engine.start(&stage).is_err());
    }

    #[test]
    fn missing_anchor_degenerates_the_region_instead_of_failing() {
        let stage = TestStage::new(800.0);
        let mut engine = Engine::new();
        engine.start(&stage).unwrap();
        engine
            .register_region(exact_region("span", "ghost"))
            .unwrap();
        engine
            .register_binding("bg", parallax_binding("bg", "span", 1.0, -100.0))
            .unwrap();

        let mut sink = MemorySink::new();
        stage.offset.set(4000.0);
        engine.tick(&stage, &mut sink, 0.0);
        assert_eq!(sink.last_batch()[0].write, PropWrite::OffsetYPercent(0.0));
    }
}
