//! `osmc:symbol` waymark decoding.
//!
//! Hiking relations often carry an `osmc:symbol` tag describing the painted
//! waymark, e.g. `red:white:red_bar` or `yellow:white:yellow_lower:3:black`.
//! The general shape is
//! `waycolour:background[:foreground[:foreground2]][:text:textcolour]`.

use serde::Serialize;

/// A waymark colour from the OSMC palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsmcColour {
    /// Name as written in the tag (`red`, `white`, ...).
    pub name: String,
    /// Hex colour for drawing; white for names outside the palette.
    pub hex: &'static str,
    /// Catalan description; the raw name for unknown colours.
    pub description: String,
}

impl OsmcColour {
    fn from_name(name: &str) -> Self {
        let (hex, description) = match name {
            "white" => ("#FFFFFF", "Blanc"),
            "yellow" => ("#FFFF00", "Groc"),
            "orange" => ("#FFA500", "Taronja"),
            "red" => ("#FF0000", "Vermell"),
            "blue" => ("#0000FF", "Blau"),
            "green" => ("#008000", "Verd"),
            "brown" => ("#8B4513", "Marró"),
            "black" => ("#000000", "Negre"),
            "gray" | "grey" => ("#808080", "Gris"),
            "purple" => ("#800080", "Lila"),
            "pink" => ("#FFC0CB", "Rosa"),
            other => ("#FFFFFF", other),
        };
        Self {
            name: name.to_string(),
            hex,
            description: description.to_string(),
        }
    }
}

/// A decoded waymark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsmcSymbol {
    /// The tag value as found.
    pub raw: String,
    pub way_colour: OsmcColour,
    /// Background colour, absent when the background is empty.
    pub background: Option<OsmcColour>,
    /// Background shape suffix (`circle`, `frame`, ...), if any.
    pub background_shape: Option<String>,
    /// Foreground symbols (`red_bar`, `white_lower`, ...).
    pub foregrounds: Vec<String>,
    pub text: Option<String>,
    pub text_colour: Option<OsmcColour>,
}

impl OsmcSymbol {
    /// Decode a tag value. Returns `None` when there is no way colour.
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.trim().split(':').collect();
        let way_colour = parts.first().filter(|s| !s.is_empty())?;

        let (background, background_shape) = match parts.get(1).filter(|s| !s.is_empty()) {
            Some(bg) => match bg.split_once('_') {
                Some((colour, shape)) => (
                    Some(OsmcColour::from_name(colour)),
                    Some(shape.to_string()),
                ),
                None => (Some(OsmcColour::from_name(bg)), None),
            },
            None => (None, None),
        };

        let rest = parts.get(2..).unwrap_or(&[]);
        // Text and text colour are the last two fields when there are three
        // or more fields after the background.
        let (foregrounds, text, text_colour) = if rest.len() >= 3 {
            let split = rest.len() - 2;
            (
                &rest[..split],
                Some(rest[split].to_string()).filter(|t| !t.is_empty()),
                Some(OsmcColour::from_name(rest[split + 1])).filter(|c| !c.name.is_empty()),
            )
        } else {
            (rest, None, None)
        };

        Some(Self {
            raw: value.to_string(),
            way_colour: OsmcColour::from_name(way_colour),
            background,
            background_shape,
            foregrounds: foregrounds
                .iter()
                .filter(|f| !f.is_empty())
                .map(|f| f.to_string())
                .collect(),
            text,
            text_colour,
        })
    }

    /// One-line Catalan description of the waymark.
    pub fn describe(&self) -> String {
        let mut out = format!("Color del camí: {}", self.way_colour.description);
        if let Some(bg) = &self.background {
            out.push_str(&format!(", Fons: {}", bg.description));
        }
        if !self.foregrounds.is_empty() {
            out.push_str(&format!(", Símbol: {}", self.foregrounds.join(" + ")));
        }
        if let Some(text) = &self.text {
            out.push_str(&format!(", Text: {text}"));
        }
        out
    }
}
