use std::collections::BTreeSet;

use crate::binding::LayerBinding;
use crate::ease::Ease;
use crate::error::{StrataError, StrataResult};
use crate::policy::{
    AmbientPolicy, AmbientRule, NumericProp, PolicyDef, PropertyRule, Rule, ScrollPolicy,
    StrokeRevealPolicy, VideoScrubPolicy,
};
use crate::region::{AnchorEdge, BoundarySpec, TriggerRegion};
use crate::scheduler::Engine;
use crate::stage::Stage;

/// One named trigger region inside a section.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionDef {
    pub id: String,
    pub anchor: String,
    pub start: BoundarySpec,
    pub end: BoundarySpec,
}

/// One layer entry: a stable layer id plus its policy. Policies are always
/// named per layer — there is no positional coupling between a layer list
/// and an effects list.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerDef {
    pub layer: String,
    pub policy: PolicyDef,
}

/// A showcase section: its regions and the layers bound over them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SectionDef {
    pub name: String,
    #[serde(default)]
    pub regions: Vec<RegionDef>,
    #[serde(default)]
    pub layers: Vec<LayerDef>,
}

/// Declarative description of the whole presentation. Everything here is
/// data; the engine semantics live entirely in the policy kinds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShowcaseDef {
    pub sections: Vec<SectionDef>,
}

impl ShowcaseDef {
    pub fn from_json(s: &str) -> StrataResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| StrataError::validation(format!("showcase JSON: {e}")))
    }

    /// Structural validation: unique ids, resolvable region references and
    /// well-formed policies, checked before anything touches the engine.
    pub fn validate(&self) -> StrataResult<()> {
        let mut region_ids = BTreeSet::new();
        let mut layer_ids = BTreeSet::new();

        for section in &self.sections {
            for region in &section.regions {
                if !region_ids.insert(region.id.as_str()) {
                    return Err(StrataError::validation(format!(
                        "duplicate region id \"{}\"",
                        region.id
                    )));
                }
                region.start.validate()?;
                region.end.validate()?;
            }
        }

        for section in &self.sections {
            for layer in &section.layers {
                if !layer_ids.insert(layer.layer.as_str()) {
                    return Err(StrataError::validation(format!(
                        "duplicate layer id \"{}\" in section \"{}\"",
                        layer.layer, section.name
                    )));
                }
                layer.policy.validate().map_err(|e| {
                    StrataError::validation(format!(
                        "layer \"{}\" in section \"{}\": {e}",
                        layer.layer, section.name
                    ))
                })?;
                if let Some(region) = layer.policy.region()
                    && !region_ids.contains(region)
                {
                    return Err(StrataError::validation(format!(
                        "layer \"{}\" references undeclared region \"{region}\"",
                        layer.layer
                    )));
                }
            }
        }
        Ok(())
    }

    /// The stock showcase: hero, multi-layer, depth, speed variations,
    /// advanced, video-on-scroll and the section headers, plus the ambient
    /// decorations. Per-layer speeds and magnitudes mirror the presentation
    /// page's data attributes.
    pub fn builtin() -> Self {
        Self {
            sections: vec![
                hero_section(),
                layers_section(),
                depth_section(),
                speed_section(),
                advanced_section(),
                video_section(),
                headers_section(),
            ],
        }
    }
}

/// What [`install`] did: how much was registered and which layers were
/// skipped because the host had no render target for them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub regions_installed: usize,
    pub bindings_installed: usize,
    pub skipped_layers: Vec<String>,
}

/// Register a showcase with the engine.
///
/// Misconfiguration (duplicate ids, dangling region references, bad
/// constants) fails fast. A missing render target is not an error: that
/// binding is skipped with a warning and everything else still installs —
/// one absent decorative layer must not take the page's animation down.
pub fn install(
    def: &ShowcaseDef,
    engine: &mut Engine,
    stage: &dyn Stage,
) -> StrataResult<InstallReport> {
    def.validate()?;

    let mut report = InstallReport::default();
    for section in &def.sections {
        for region in &section.regions {
            engine.register_region(TriggerRegion::new(
                region.id.clone(),
                region.anchor.clone(),
                region.start,
                region.end,
            ))?;
            report.regions_installed += 1;
        }
    }

    for section in &def.sections {
        for layer in &section.layers {
            if !stage.target_exists(&layer.layer) {
                tracing::warn!(layer = %layer.layer, section = %section.name,
                    "render target missing; binding skipped");
                report.skipped_layers.push(layer.layer.clone());
                continue;
            }

            let binding = match &layer.policy {
                PolicyDef::Scroll(p) => LayerBinding::scroll(
                    layer.layer.clone(),
                    p.region.clone(),
                    p.speed,
                    p.ease,
                    p.rules.clone(),
                ),
                PolicyDef::StrokeReveal(p) => {
                    let Some(resolved) = stage.resolved_stroke(&layer.layer) else {
                        tracing::warn!(layer = %layer.layer, section = %section.name,
                            "stroke style not resolvable; binding skipped");
                        report.skipped_layers.push(layer.layer.clone());
                        continue;
                    };
                    LayerBinding::stroke_reveal(layer.layer.clone(), p, &resolved)
                }
                PolicyDef::VideoScrub(p) => LayerBinding::video_scrub(layer.layer.clone(), p),
                PolicyDef::Ambient(p) => {
                    LayerBinding::ambient(layer.layer.clone(), p.rules.clone())
                }
            };
            engine.register_binding(layer.layer.clone(), binding)?;
            report.bindings_installed += 1;
        }
    }

    tracing::debug!(
        regions = report.regions_installed,
        bindings = report.bindings_installed,
        skipped = report.skipped_layers.len(),
        "showcase installed"
    );
    Ok(report)
}

fn region(id: &str, anchor: &str, start: (AnchorEdge, f64), end: (AnchorEdge, f64)) -> RegionDef {
    RegionDef {
        id: id.to_owned(),
        anchor: anchor.to_owned(),
        start: BoundarySpec::new(start.0, start.1),
        end: BoundarySpec::new(end.0, end.1),
    }
}

fn scaled(prop: NumericProp, base: f64) -> PropertyRule {
    PropertyRule {
        prop,
        rule: Rule::Scaled { base },
    }
}

fn fixed(prop: NumericProp, from: f64, to: f64) -> PropertyRule {
    PropertyRule {
        prop,
        rule: Rule::Fixed { from, to },
    }
}

fn scroll_layer(
    layer: &str,
    region: &str,
    speed: f64,
    ease: Ease,
    rules: Vec<PropertyRule>,
) -> LayerDef {
    LayerDef {
        layer: layer.to_owned(),
        policy: PolicyDef::Scroll(ScrollPolicy {
            region: region.to_owned(),
            speed,
            ease,
            rules,
        }),
    }
}

fn ambient_layer(layer: &str, rules: Vec<AmbientRule>) -> LayerDef {
    LayerDef {
        layer: layer.to_owned(),
        policy: PolicyDef::Ambient(AmbientPolicy { rules }),
    }
}

fn ambient(prop: NumericProp, from: f64, to: f64, duration_secs: f64) -> AmbientRule {
    AmbientRule {
        prop,
        from,
        to,
        duration_secs,
        ease: Ease::InOutQuad,
    }
}

fn fade_up_rules(rise_px: f64) -> Vec<PropertyRule> {
    vec![
        fixed(NumericProp::Opacity, 0.0, 1.0),
        fixed(NumericProp::OffsetYPx, rise_px, 0.0),
    ]
}

fn hero_section() -> SectionDef {
    let mut layers = Vec::new();

    // Background strata drift at their own speeds over the full sweep.
    for (layer, speed) in [
        ("hero-layer-back", 0.2),
        ("hero-layer-mid", 0.5),
        ("hero-layer-front", 0.8),
    ] {
        layers.push(scroll_layer(
            layer,
            "hero-span",
            speed,
            Ease::Linear,
            vec![scaled(NumericProp::OffsetYPercent, -30.0)],
        ));
    }

    for line in ["hero-title-line-1", "hero-title-line-2", "hero-title-line-3"] {
        layers.push(scroll_layer(
            line,
            "hero-title-span",
            1.0,
            Ease::OutCubic,
            fade_up_rules(100.0),
        ));
    }

    for path in ["hero-path-1", "hero-path-2"] {
        layers.push(scroll_layer(
            path,
            "hero-paths-span",
            1.0,
            Ease::OutCubic,
            vec![fixed(NumericProp::StrokeDashoffset, 1000.0, 0.0)],
        ));
    }

    for (i, element) in ["hero-float-1", "hero-float-2", "hero-float-3"]
        .into_iter()
        .enumerate()
    {
        let leg = 3.0 + i as f64;
        layers.push(ambient_layer(
            element,
            vec![
                ambient(NumericProp::OffsetYPx, 0.0, -30.0, leg),
                ambient(NumericProp::RotationDeg, 0.0, 360.0, leg),
            ],
        ));
    }

    layers.push(ambient_layer(
        "scroll-indicator-line",
        vec![ambient(NumericProp::OffsetYPx, 0.0, 20.0, 2.0)],
    ));
    layers.push(ambient_layer(
        "cta-button",
        vec![ambient(NumericProp::Scale, 1.0, 1.05, 2.0)],
    ));

    SectionDef {
        name: "hero".to_owned(),
        regions: vec![
            region(
                "hero-span",
                "hero",
                (AnchorEdge::Top, 1.0),
                (AnchorEdge::Bottom, 0.0),
            ),
            region(
                "hero-title-span",
                "hero",
                (AnchorEdge::Top, 0.5),
                (AnchorEdge::Center, 0.5),
            ),
            region(
                "hero-paths-span",
                "hero",
                (AnchorEdge::Top, 0.5),
                (AnchorEdge::Bottom, 0.5),
            ),
        ],
        layers,
    }
}

fn layers_section() -> SectionDef {
    let mut regions = vec![region(
        "layers-span",
        "layers",
        (AnchorEdge::Top, 0.8),
        (AnchorEdge::Bottom, 0.2),
    )];
    let mut layers = Vec::new();

    // Each card drifts toward its own corner, scaled by its depth speed.
    for (layer, speed, x, y) in [
        ("layer-card-1", 0.6, -250.0, -180.0),
        ("layer-card-2", 0.8, 160.0, -140.0),
        ("layer-card-3", 1.0, -80.0, 150.0),
        ("layer-card-4", 1.2, 110.0, 50.0),
    ] {
        layers.push(scroll_layer(
            layer,
            "layers-span",
            speed,
            Ease::Linear,
            vec![
                scaled(NumericProp::OffsetXPercent, x),
                scaled(NumericProp::OffsetYPercent, y),
            ],
        ));

        let content = format!("{layer}-content");
        let span = format!("{content}-span");
        regions.push(region(
            &span,
            &content,
            (AnchorEdge::Top, 0.9),
            (AnchorEdge::Bottom, 0.1),
        ));
        let mut rules = fade_up_rules(50.0);
        rules.push(fixed(NumericProp::Scale, 0.8, 1.0));
        layers.push(scroll_layer(&content, &span, 1.0, Ease::OutCubic, rules));
    }

    SectionDef {
        name: "layers".to_owned(),
        regions,
        layers,
    }
}

fn depth_section() -> SectionDef {
    let mut layers = Vec::new();
    for (layer, speed, rise, zoom) in [
        ("depth-mountains", 0.3, -120.0, 1.8),
        ("depth-clouds", 0.5, -80.0, 1.5),
        ("depth-trees", 0.7, -50.0, 1.3),
        ("depth-foreground", 0.9, -20.0, 1.1),
    ] {
        layers.push(scroll_layer(
            layer,
            "depth-span",
            speed,
            Ease::Linear,
            vec![
                scaled(NumericProp::OffsetYPercent, rise),
                fixed(NumericProp::Scale, 1.0, zoom),
            ],
        ));
    }
    layers.push(scroll_layer(
        "depth-content",
        "depth-content-span",
        1.0,
        Ease::OutCubic,
        fade_up_rules(100.0),
    ));

    SectionDef {
        name: "depth".to_owned(),
        regions: vec![
            region(
                "depth-span",
                "depth",
                (AnchorEdge::Top, 1.0),
                (AnchorEdge::Bottom, 0.0),
            ),
            region(
                "depth-content-span",
                "depth-content",
                (AnchorEdge::Top, 0.9),
                (AnchorEdge::Bottom, 0.1),
            ),
        ],
        layers,
    }
}

fn speed_section() -> SectionDef {
    // Fixed-magnitude on purpose: the speed demo's sweep ranges are absolute
    // and ignore the per-layer speed factor entirely.
    let layers = [
        ("speed-item-slow", -30.0, 1.05),
        ("speed-item-medium", -160.0, 1.2),
        ("speed-item-fast", -300.0, 1.4),
    ]
    .into_iter()
    .map(|(layer, rise, zoom)| {
        scroll_layer(
            layer,
            "speed-span",
            1.0,
            Ease::Linear,
            vec![
                fixed(NumericProp::OffsetYPercent, 0.0, rise),
                fixed(NumericProp::Scale, 1.0, zoom),
            ],
        )
    })
    .collect();

    SectionDef {
        name: "speed".to_owned(),
        regions: vec![region(
            "speed-span",
            "speed",
            (AnchorEdge::Top, 0.8),
            (AnchorEdge::Bottom, 0.2),
        )],
        layers,
    }
}

fn advanced_section() -> SectionDef {
    let mut layers = Vec::new();
    for (layer, speed) in [
        ("advanced-layer-1", 0.4),
        ("advanced-layer-2", 0.7),
        ("advanced-layer-3", 1.0),
    ] {
        layers.push(scroll_layer(
            layer,
            "advanced-span",
            speed,
            Ease::Linear,
            vec![
                scaled(NumericProp::OffsetYPercent, -50.0),
                scaled(NumericProp::OffsetXPercent, 20.0),
                scaled(NumericProp::RotationDeg, 5.0),
            ],
        ));
    }

    for path in ["advanced-path-1", "advanced-path-2", "advanced-path-3"] {
        layers.push(LayerDef {
            layer: path.to_owned(),
            policy: PolicyDef::StrokeReveal(StrokeRevealPolicy {
                region: "advanced-paths-span".to_owned(),
                ease: Ease::OutCubic,
                dash_from: 2000.0,
                dash_to: 0.0,
                width_from_px: 0.5,
                width_scale: 2.0,
            }),
        });
    }

    layers.push(scroll_layer(
        "advanced-container",
        "advanced-span",
        1.0,
        Ease::Linear,
        vec![
            fixed(NumericProp::Scale, 1.0, 1.1),
            fixed(NumericProp::RotationDeg, 0.0, 2.0),
        ],
    ));

    SectionDef {
        name: "advanced".to_owned(),
        regions: vec![
            region(
                "advanced-span",
                "advanced",
                (AnchorEdge::Top, 1.0),
                (AnchorEdge::Bottom, 0.0),
            ),
            region(
                "advanced-paths-span",
                "advanced",
                (AnchorEdge::Top, 0.5),
                (AnchorEdge::Bottom, 0.5),
            ),
        ],
        layers,
    }
}

fn video_section() -> SectionDef {
    SectionDef {
        name: "video".to_owned(),
        regions: vec![region(
            "video-span",
            "video-section",
            (AnchorEdge::Top, 1.0),
            (AnchorEdge::Bottom, 0.0),
        )],
        layers: vec![LayerDef {
            layer: "scroll-video".to_owned(),
            policy: PolicyDef::VideoScrub(VideoScrubPolicy {
                region: "video-span".to_owned(),
            }),
        }],
    }
}

fn headers_section() -> SectionDef {
    let mut regions = Vec::new();
    let mut layers = Vec::new();
    for anchor in ["layers", "depth", "speed", "advanced", "video-section"] {
        let span = format!("{anchor}-header-span");
        regions.push(region(
            &span,
            anchor,
            (AnchorEdge::Top, 0.8),
            (AnchorEdge::Center, 0.5),
        ));
        layers.push(scroll_layer(
            &format!("{anchor}-header"),
            &span,
            1.0,
            Ease::OutCubic,
            fade_up_rules(50.0),
        ));
    }

    SectionDef {
        name: "headers".to_owned(),
        regions,
        layers,
    }
}
