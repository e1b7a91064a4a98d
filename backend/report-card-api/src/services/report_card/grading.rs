//! Score bands, pass/fail decisions and the colours derived from them.
//!
//! Bands and the palette are plain data so the pass mark and the colours can
//! come from configuration. Only an average at or above the highlight mark
//! gets the highlight colour; subject and period scores are pass or fail.

use serde::{de, Deserialize, Deserializer};

use crate::services::translator::Translate;

pub const DEFAULT_PASSING_SCORE: f32 = 10.0;
pub const DEFAULT_HIGHLIGHT_SCORE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RgbColor::from_hex(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid colour '{raw}', expected #rrggbb")))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub fail: RgbColor,
    pub pass: RgbColor,
    pub highlight: RgbColor,
    pub accent: RgbColor,
    pub text: RgbColor,
    pub muted: RgbColor,
    pub border: RgbColor,
    pub header_fill: RgbColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            fail: RgbColor::new(0.78, 0.16, 0.16),
            pass: RgbColor::new(0.08, 0.08, 0.08),
            highlight: RgbColor::new(0.11, 0.53, 0.27),
            accent: RgbColor::new(0.16, 0.4, 0.69),
            text: RgbColor::new(0.08, 0.08, 0.08),
            muted: RgbColor::new(0.42, 0.42, 0.42),
            border: RgbColor::new(0.65, 0.65, 0.65),
            header_fill: RgbColor::new(0.91, 0.94, 0.98),
        }
    }
}

impl Palette {
    pub fn for_tone(&self, tone: ScoreTone) -> RgbColor {
        match tone {
            ScoreTone::Fail => self.fail,
            ScoreTone::Pass => self.pass,
            ScoreTone::Highlight => self.highlight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTone {
    Fail,
    Pass,
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Appreciation {
    Excellent,
    VeryGood,
    Good,
    Satisfactory,
    Passing,
    NeedsImprovement,
    Weak,
    VeryWeak,
}

impl Appreciation {
    pub fn translation_key(&self) -> &'static str {
        match self {
            Appreciation::Excellent => "appreciation.excellent",
            Appreciation::VeryGood => "appreciation.very_good",
            Appreciation::Good => "appreciation.good",
            Appreciation::Satisfactory => "appreciation.satisfactory",
            Appreciation::Passing => "appreciation.passing",
            Appreciation::NeedsImprovement => "appreciation.needs_improvement",
            Appreciation::Weak => "appreciation.weak",
            Appreciation::VeryWeak => "appreciation.very_weak",
        }
    }
}

/// Lower bound (inclusive) of an appreciation band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub min_score: f32,
    pub appreciation: Appreciation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradingScale {
    bands: Vec<GradeBand>,
    pub passing_score: f32,
    pub highlight_score: f32,
}

impl Default for GradingScale {
    fn default() -> Self {
        let bands = [
            (18.0, Appreciation::Excellent),
            (16.0, Appreciation::VeryGood),
            (14.0, Appreciation::Good),
            (12.0, Appreciation::Satisfactory),
            (10.0, Appreciation::Passing),
            (8.0, Appreciation::NeedsImprovement),
            (6.0, Appreciation::Weak),
        ]
        .into_iter()
        .map(|(min_score, appreciation)| GradeBand {
            min_score,
            appreciation,
        })
        .collect();

        Self {
            bands,
            passing_score: DEFAULT_PASSING_SCORE,
            highlight_score: DEFAULT_HIGHLIGHT_SCORE,
        }
    }
}

impl GradingScale {
    /// Custom bands; they are kept sorted from the highest bound down.
    pub fn new(mut bands: Vec<GradeBand>, passing_score: f32, highlight_score: f32) -> Self {
        bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        Self {
            bands,
            passing_score,
            highlight_score,
        }
    }

    pub fn with_passing_score(mut self, passing_score: f32) -> Self {
        self.passing_score = passing_score;
        self
    }

    pub fn with_highlight_score(mut self, highlight_score: f32) -> Self {
        self.highlight_score = highlight_score;
        self
    }

    /// Scores exactly on a bound belong to the higher band.
    pub fn classify(&self, score: f32) -> Appreciation {
        self.bands
            .iter()
            .find(|band| score >= band.min_score)
            .map(|band| band.appreciation)
            .unwrap_or(Appreciation::VeryWeak)
    }

    pub fn is_passing(&self, score: f32) -> bool {
        score >= self.passing_score
    }

    pub fn tone_for(&self, score: f32) -> ScoreTone {
        if !self.is_passing(score) {
            ScoreTone::Fail
        } else if score >= self.highlight_score {
            ScoreTone::Highlight
        } else {
            ScoreTone::Pass
        }
    }

    /// Tone of a subject or period score, which is never highlighted.
    pub fn cell_tone(&self, score: f32) -> ScoreTone {
        if self.is_passing(score) {
            ScoreTone::Pass
        } else {
            ScoreTone::Fail
        }
    }

    pub fn color_for(&self, score: f32, palette: &Palette) -> RgbColor {
        palette.for_tone(self.tone_for(score))
    }
}

/// Score-driven styling: appreciation labels and colours for one document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionalStyleResolver {
    pub scale: GradingScale,
    pub palette: Palette,
}

impl ConditionalStyleResolver {
    pub fn new(scale: GradingScale, palette: Palette) -> Self {
        Self { scale, palette }
    }

    pub fn passing_score(&self) -> f32 {
        self.scale.passing_score
    }

    pub fn classify(&self, score: f32) -> Appreciation {
        self.scale.classify(score)
    }

    pub fn label(&self, score: f32, translator: &dyn Translate) -> String {
        translator.translate(self.classify(score).translation_key(), &[])
    }

    /// Colour of an average.
    pub fn color_for(&self, score: f32) -> RgbColor {
        self.scale.color_for(score, &self.palette)
    }

    /// Colour of a score inside the subject table.
    pub fn cell_color(&self, score: f32) -> RgbColor {
        self.palette.for_tone(self.scale.cell_tone(score))
    }

    pub fn is_passing(&self, score: f32) -> bool {
        self.scale.is_passing(score)
    }
}
