//! Binding of canonical facial channels onto a rig's morph targets.
//!
//! Matching is tiered and the first hit wins per channel: exact name, alias
//! list, case-insensitive alias list. Rigs that number their morph targets in
//! canonical order skip all of that, and a handful of high-priority channels get
//! one last substring heuristic.

use crate::Side;
use api::{CanonicalChannel, Diagnostic, DiagnosticSink, NullSink, RigMorphCatalog};
use std::collections::HashMap;

/// Minimum count of `0..n` numeric names for a catalog to be treated as
/// canonically ordered.
pub const NUMERIC_MIN_SLOTS: usize = 50;

/// Morph slot per canonical channel for one rig. Unmatched channels are
/// simply absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    slots: [Option<usize>; CanonicalChannel::COUNT],
    numeric: bool,
}

impl Default for ChannelBinding {
    fn default() -> Self {
        Self {
            slots: [None; CanonicalChannel::COUNT],
            numeric: false,
        }
    }
}

impl ChannelBinding {
    pub fn slot(&self, channel: CanonicalChannel) -> Option<usize> {
        self.slots[channel as usize]
    }

    pub fn is_bound(&self, channel: CanonicalChannel) -> bool {
        self.slot(channel).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalChannel, usize)> + '_ {
        CanonicalChannel::ALL
            .iter()
            .filter_map(|c| self.slot(*c).map(|s| (*c, s)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unmatched(&self) -> Vec<CanonicalChannel> {
        CanonicalChannel::ALL
            .iter()
            .copied()
            .filter(|c| !self.is_bound(*c))
            .collect()
    }

    /// True when the rig was bound through its numeric, canonically ordered names.
    pub fn used_numeric_fallback(&self) -> bool {
        self.numeric
    }

    pub(crate) fn unbind(&mut self, channel: CanonicalChannel) {
        self.slots[channel as usize] = None;
    }

    fn claims(&self, slot: usize) -> bool {
        self.slots.contains(&Some(slot))
    }
}

/// Known spellings of canonical channels in other rig-authoring conventions,
/// tried after the generated delimiter/casing variants.
const CURATED_ALIASES: &[(CanonicalChannel, &[&str])] = {
    use CanonicalChannel::*;
    &[
        (EyeBlinkLeft, &["Blink_L", "EyeClosedLeft", "Fcl_EYE_Close_L"]),
        (EyeBlinkRight, &["Blink_R", "EyeClosedRight", "Fcl_EYE_Close_R"]),
        (EyeLookDownLeft, &["Eye_L_Look_Down"]),
        (EyeLookDownRight, &["Eye_R_Look_Down"]),
        (EyeLookUpLeft, &["Eye_L_Look_Up"]),
        (EyeLookUpRight, &["Eye_R_Look_Up"]),
        (EyeLookInLeft, &["Eye_L_Look_R"]),
        (EyeLookInRight, &["Eye_R_Look_L"]),
        (EyeLookOutLeft, &["Eye_L_Look_L"]),
        (EyeLookOutRight, &["Eye_R_Look_R"]),
        (JawLeft, &["Jaw_L"]),
        (JawRight, &["Jaw_R"]),
        (JawOpen, &["MouthOpen", "mouthOpen", "mouth_open"]),
        (MouthClose, &["MouthClosed", "mouthClosed"]),
        (MouthFunnel, &["LipFunnel"]),
        (MouthPucker, &["LipPucker"]),
        (MouthLeft, &["Mouth_L"]),
        (MouthRight, &["Mouth_R"]),
        (MouthSmileLeft, &["MouthCornerPullLeft", "Smile_L"]),
        (MouthSmileRight, &["MouthCornerPullRight", "Smile_R"]),
        (MouthRollLower, &["Mouth_Roll_In_Lower", "LipSuckLower"]),
        (MouthRollUpper, &["Mouth_Roll_In_Upper", "LipSuckUpper"]),
        (MouthShrugLower, &["MouthRaiserLower"]),
        (MouthShrugUpper, &["MouthRaiserUpper"]),
        (BrowDownLeft, &["BrowLowererLeft", "Brow_Drop_L"]),
        (BrowDownRight, &["BrowLowererRight", "Brow_Drop_R"]),
        (BrowInnerUp, &["Brow_Raise_Inner"]),
        (BrowOuterUpLeft, &["Brow_Raise_Outer_L"]),
        (BrowOuterUpRight, &["Brow_Raise_Outer_R"]),
        (CheekPuff, &["cheekPuffed"]),
        (CheekSquintLeft, &["Cheek_Raise_L"]),
        (CheekSquintRight, &["Cheek_Raise_R"]),
        (NoseSneerLeft, &["Nose_Flank_Raise_L"]),
        (NoseSneerRight, &["Nose_Flank_Raise_R"]),
    ]
};

struct FuzzyRule {
    channel: CanonicalChannel,
    semantic: &'static [&'static str],
    side: Option<Side>,
}

const FUZZY_RULES: &[FuzzyRule] = &[
    FuzzyRule {
        channel: CanonicalChannel::EyeBlinkLeft,
        semantic: &["blink", "closed"],
        side: Some(Side::Left),
    },
    FuzzyRule {
        channel: CanonicalChannel::EyeBlinkRight,
        semantic: &["blink", "closed"],
        side: Some(Side::Right),
    },
    FuzzyRule {
        channel: CanonicalChannel::JawOpen,
        semantic: &["jawopen", "jaw_open", "mouthopen", "mouth_open"],
        side: None,
    },
];

/// Splits a camelCase identifier into its words.
fn split_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    for (i, ch) in name.char_indices().skip(1) {
        if ch.is_ascii_uppercase() {
            words.push(&name[start..i]);
            start = i;
        }
    }
    words.push(&name[start..]);
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Alias list for `channel`, in the order it is tried.
pub fn aliases(channel: CanonicalChannel) -> Vec<String> {
    let words = split_words(channel.name());
    let pascal: String = words.iter().map(|w| capitalize(w)).collect();
    let snake = words.join("_").to_lowercase();
    let title_snake = words.iter().map(|w| capitalize(w)).collect::<Vec<_>>().join("_");

    let side = match words.last() {
        Some(&"Left") => Some(Side::Left),
        Some(&"Right") => Some(Side::Right),
        _ => None,
    };

    let mut out = vec![pascal];

    match side {
        Some(side) => {
            let base = &words[..words.len() - 1];
            let camel_base = base.concat();
            let pascal_base: String = base.iter().map(|w| capitalize(w)).collect();
            let title_base = base.iter().map(|w| capitalize(w)).collect::<Vec<_>>().join("_");
            let snake_base = base.join("_").to_lowercase();
            let (long, short) = match side {
                Side::Left => ("Left", "L"),
                Side::Right => ("Right", "R"),
            };

            out.extend([
                format!("{camel_base}_{short}"),
                format!("{pascal_base}_{short}"),
                format!("{camel_base}_{long}"),
                snake,
                format!("{snake_base}_{}", short.to_lowercase()),
                format!("{title_base}_{short}"),
                format!("{camel_base}{short}"),
                format!("{pascal_base}{short}"),
                format!("{camel_base}.{short}"),
                format!("{short}_{pascal_base}"),
                format!("{long}{pascal_base}"),
            ]);
        }
        None => out.extend([snake, title_snake]),
    }

    if let Some((_, extra)) = CURATED_ALIASES.iter().find(|(c, _)| *c == channel) {
        out.extend(extra.iter().map(|s| s.to_string()));
    }

    out.dedup();
    out
}

/// `marker` followed by a non-alphanumeric character or the end of the
/// name, so `_l` matches `blink_l` and `blink_l.001` but not `eye_lid`.
fn has_delimited_marker(lower: &str, marker: &str) -> bool {
    lower.match_indices(marker).any(|(i, _)| {
        lower[i + marker.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric())
    })
}

fn has_side_token(lower: &str, side: Side) -> bool {
    let (word, markers, trailing, opposite, opposite_markers) = match side {
        Side::Left => ("left", ["_l", ".l"], 'l', "right", ["_r", ".r"]),
        Side::Right => ("right", ["_r", ".r"], 'r', "left", ["_l", ".l"]),
    };
    if lower.contains(opposite)
        || opposite_markers
            .iter()
            .any(|m| has_delimited_marker(lower, m))
    {
        return false;
    }
    lower.contains(word)
        || markers.iter().any(|m| has_delimited_marker(lower, m))
        || lower.ends_with(trailing)
}

/// True when every name that parses as an integer together forms `0..n`
/// with `n >= NUMERIC_MIN_SLOTS`.
fn is_numeric_layout(catalog: &RigMorphCatalog) -> bool {
    let mut numbers: Vec<usize> = catalog
        .iter()
        .filter_map(|(name, _)| {
            name.parse::<usize>()
                .ok()
                .filter(|n| n.to_string() == name)
        })
        .collect();
    numbers.sort_unstable();
    numbers.dedup();

    numbers.len() >= NUMERIC_MIN_SLOTS && numbers.iter().enumerate().all(|(i, n)| i == *n)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AliasResolver;

impl AliasResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, catalog: &RigMorphCatalog) -> ChannelBinding {
        self.resolve_with_sink(catalog, &NullSink)
    }

    pub fn resolve_with_sink(
        &self,
        catalog: &RigMorphCatalog,
        sink: &dyn DiagnosticSink,
    ) -> ChannelBinding {
        let binding = if is_numeric_layout(catalog) {
            Self::resolve_numeric(catalog)
        } else {
            Self::resolve_named(catalog)
        };

        sink.report(&Diagnostic::ChannelCoverage {
            bound: binding.len(),
            total: CanonicalChannel::COUNT,
            numeric_fallback: binding.numeric,
            unmatched: binding.unmatched(),
        });

        binding
    }

    fn resolve_numeric(catalog: &RigMorphCatalog) -> ChannelBinding {
        let mut binding = ChannelBinding {
            numeric: true,
            ..ChannelBinding::default()
        };
        for channel in CanonicalChannel::ALL {
            binding.slots[channel as usize] = catalog.get(&channel.index().to_string());
        }
        binding
    }

    fn resolve_named(catalog: &RigMorphCatalog) -> ChannelBinding {
        let mut binding = ChannelBinding::default();
        if catalog.is_empty() {
            return binding;
        }

        let exact: HashMap<&str, usize> = catalog.iter().collect();
        let mut folded: HashMap<String, usize> = HashMap::new();
        for (name, slot) in catalog.iter() {
            folded.entry(name.to_lowercase()).or_insert(slot);
        }

        for channel in CanonicalChannel::ALL {
            let list = aliases(channel);

            let slot = exact
                .get(channel.name())
                .or_else(|| list.iter().find_map(|a| exact.get(a.as_str())))
                .or_else(|| folded.get(&channel.name().to_lowercase()))
                .or_else(|| list.iter().find_map(|a| folded.get(&a.to_lowercase())))
                .copied();

            binding.slots[channel as usize] = slot;
        }

        for rule in FUZZY_RULES {
            if binding.is_bound(rule.channel) {
                continue;
            }
            let hit = catalog.iter().find(|(name, slot)| {
                let lower = name.to_lowercase();
                !binding.claims(*slot)
                    && rule.semantic.iter().any(|t| lower.contains(t))
                    && rule.side.map_or(true, |side| has_side_token(&lower, side))
            });
            if let Some((_, slot)) = hit {
                binding.slots[rule.channel as usize] = Some(slot);
            }
        }

        binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("eyeBlinkLeft"), vec!["eye", "Blink", "Left"]);
        assert_eq!(split_words("tongueOut"), vec!["tongue", "Out"]);
    }

    #[test]
    fn test_aliases_cover_common_conventions() {
        let list = aliases(CanonicalChannel::EyeBlinkLeft);
        for expected in [
            "EyeBlinkLeft",
            "eyeBlink_L",
            "eye_blink_left",
            "Eye_Blink_L",
            "eyeBlinkL",
            "eyeBlink.L",
            "Blink_L",
        ] {
            assert!(list.iter().any(|a| a == expected), "missing {expected}");
        }

        let list = aliases(CanonicalChannel::JawOpen);
        assert_eq!(&list[..3], &["JawOpen", "jaw_open", "Jaw_Open"]);
    }

    #[test]
    fn test_side_tokens() {
        assert!(has_side_token("eyes_closed_l", Side::Left));
        assert!(has_side_token("blinkleft", Side::Left));
        assert!(has_side_token("blinkl", Side::Left));
        assert!(!has_side_token("blink_right", Side::Left));
        assert!(has_side_token("blink_r", Side::Right));
        assert!(has_side_token("blink.l", Side::Left));
    }

    #[test]
    fn test_side_markers_need_a_delimiter() {
        assert!(!has_side_token("eye_lid_closed_r", Side::Left));
        assert!(has_side_token("eye_lid_closed_r", Side::Right));
        assert!(has_side_token("eye_lid_closed_l", Side::Left));
        assert!(!has_side_token("eye_lid_closed_l", Side::Right));
        assert!(has_side_token("blink_l_001", Side::Left));
        assert!(!has_side_token("eye_roll", Side::Right));
    }

    #[test]
    fn test_numeric_layout_requires_contiguous_range() {
        let contiguous = RigMorphCatalog::from_names((0..52).map(|i| i.to_string())).unwrap();
        assert!(is_numeric_layout(&contiguous));

        let short = RigMorphCatalog::from_names((0..20).map(|i| i.to_string())).unwrap();
        assert!(!is_numeric_layout(&short));

        let gapped = RigMorphCatalog::from_names((1..60).map(|i| i.to_string())).unwrap();
        assert!(!is_numeric_layout(&gapped));
    }
}
