use serde::{Deserialize, Serialize};

/// Case transformation applied to the final basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseTransform {
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "lower")]
    Lower,
    #[serde(rename = "UPPER")]
    Upper,
    #[serde(rename = "Capitalize")]
    Capitalize,
    #[serde(rename = "camelCase")]
    CamelCase,
    #[serde(rename = "PascalCase")]
    PascalCase,
    #[serde(rename = "Title Case")]
    TitleCase,
}

/// Separator transformation applied to the final basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeparatorTransform {
    #[default]
    #[serde(rename = "as-is")]
    AsIs,
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "kebab-case")]
    KebabCase,
    #[serde(rename = "space")]
    Space,
}

/// Post-transform applied once to the composed basename, after all
/// name-fragment modules have run. Order: Greeklish, then case, then
/// separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameTransform {
    #[serde(default)]
    pub case: CaseTransform,
    #[serde(default)]
    pub separator: SeparatorTransform,
    #[serde(default)]
    pub greeklish: bool,
}

impl NameTransform {
    /// True if any transformation deviates from the identity defaults.
    pub fn is_effective(&self) -> bool {
        self.case != CaseTransform::Original
            || self.separator != SeparatorTransform::AsIs
            || self.greeklish
    }

    /// Apply the configured transformations to `base_name`. Falls back to
    /// the untransformed input when the output would be empty.
    pub fn apply(&self, base_name: &str) -> String {
        let original = base_name;
        let mut name = base_name.to_string();

        if self.greeklish {
            name = transliterate_greek(&name);
        }

        name = match self.case {
            CaseTransform::Original => name,
            CaseTransform::Lower => name.to_lowercase(),
            CaseTransform::Upper => name.to_uppercase(),
            CaseTransform::Capitalize => capitalize(&name),
            CaseTransform::CamelCase => join_words(&name, false),
            CaseTransform::PascalCase => join_words(&name, true),
            CaseTransform::TitleCase => title_case(&name),
        };

        name = match self.separator {
            SeparatorTransform::AsIs => name,
            SeparatorTransform::SnakeCase => name.replace([' ', '-'], "_"),
            SeparatorTransform::KebabCase => name.replace([' ', '_'], "-"),
            SeparatorTransform::Space => name.replace(['_', '-'], " "),
        };

        if name.trim().is_empty() {
            tracing::warn!("empty transform output, falling back to original: {original}");
            return original.to_string();
        }

        name
    }
}

/// Uppercase the first letter, lowercase the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        },
    }
}

/// Capitalize each word in place, preserving existing separators.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Split a name into words at separators and lower-to-upper case
/// boundaries.
fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in s.chars() {
        if matches!(c, ' ' | '_' | '-') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else {
            if prev_lower && c.is_uppercase() && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase();
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Join words camelCase (`pascal = false`) or PascalCase (`pascal = true`).
fn join_words(s: &str, pascal: bool) -> String {
    let words = split_words(s);
    let mut out = String::with_capacity(s.len());
    for (i, word) in words.iter().enumerate() {
        if i == 0 && !pascal {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Transliterate Greek characters to their Latin (greeklish) equivalents.
/// Non-Greek characters pass through unchanged.
pub fn transliterate_greek(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'α' | 'ά' => out.push('a'),
            'β' => out.push('v'),
            'γ' => out.push('g'),
            'δ' => out.push('d'),
            'ε' | 'έ' => out.push('e'),
            'ζ' => out.push('z'),
            'η' | 'ή' => out.push('i'),
            'θ' => out.push_str("th"),
            'ι' | 'ί' | 'ϊ' | 'ΐ' => out.push('i'),
            'κ' => out.push('k'),
            'λ' => out.push('l'),
            'μ' => out.push('m'),
            'ν' => out.push('n'),
            'ξ' => out.push('x'),
            'ο' | 'ό' => out.push('o'),
            'π' => out.push('p'),
            'ρ' => out.push('r'),
            'σ' | 'ς' => out.push('s'),
            'τ' => out.push('t'),
            'υ' | 'ύ' | 'ϋ' | 'ΰ' => out.push('y'),
            'φ' => out.push('f'),
            'χ' => out.push_str("ch"),
            'ψ' => out.push_str("ps"),
            'ω' | 'ώ' => out.push('o'),
            'Α' | 'Ά' => out.push('A'),
            'Β' => out.push('V'),
            'Γ' => out.push('G'),
            'Δ' => out.push('D'),
            'Ε' | 'Έ' => out.push('E'),
            'Ζ' => out.push('Z'),
            'Η' | 'Ή' => out.push('I'),
            'Θ' => out.push_str("Th"),
            'Ι' | 'Ί' | 'Ϊ' => out.push('I'),
            'Κ' => out.push('K'),
            'Λ' => out.push('L'),
            'Μ' => out.push('M'),
            'Ν' => out.push('N'),
            'Ξ' => out.push('X'),
            'Ο' | 'Ό' => out.push('O'),
            'Π' => out.push('P'),
            'Ρ' => out.push('R'),
            'Σ' => out.push('S'),
            'Τ' => out.push('T'),
            'Υ' | 'Ύ' | 'Ϋ' => out.push('Y'),
            'Φ' => out.push('F'),
            'Χ' => out.push_str("Ch"),
            'Ψ' => out.push_str("Ps"),
            'Ω' | 'Ώ' => out.push('O'),
            other => out.push(other),
        }
    }
    out
}
