//! Operator-name canonicalization.
//!
//! The fleet feed carries free-form operator strings that vary in casing,
//! diacritics, and verbosity ("İSTANBUL HALK ULAŞIM TİC.A.Ş", "ist halk
//! otobus isletmeleri", ...). Everything downstream — the company filter,
//! search, export — works on canonical labels produced here.
//!
//! Matching is substring-based against an *ordered* rule table: the first
//! rule whose match string occurs in the normalized input wins. Order
//! matters because match strings overlap; keep specific rules above generic
//! ones (e.g. `ist halk otobus` before any bare `halk` rule that might be
//! added later). Do not convert the table to a map.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::vehicle::VehicleSnapshot;

/// Canonical label for the Istanbul public-transport operator, which the
/// feed spells a half-dozen ways.
pub const HALK_LABEL: &str = "İSTANBUL HALK ULAŞIM TİC.A.Ş";

/// Label returned for empty operator names.
pub const UNKNOWN_LABEL: &str = "BILINMIYOR";

/// One ordered canonicalization rule: if the normalized operator name
/// contains `matches`, the operator is labeled `label`.
#[derive(Debug, Clone, Copy)]
pub struct CompanyRule {
    /// Normalized substring to look for.
    pub matches: &'static str,
    /// Canonical label to return.
    pub label: &'static str,
}

/// First-match-wins rule table. Order is load-bearing; see the module docs.
pub const COMPANY_PRESETS: &[CompanyRule] = &[
    CompanyRule { matches: "iett", label: "IETT" },
    CompanyRule { matches: "ozulas", label: "OZULAS A.S" },
    CompanyRule { matches: "halk ulasim", label: HALK_LABEL },
    CompanyRule { matches: "mavi marmara", label: "MAVI MARMARA" },
    CompanyRule { matches: "ist halk otobus", label: "IST HALK OTOBUS" },
    CompanyRule { matches: "elit karayolu", label: "ELIT KARAYOLU" },
    CompanyRule { matches: "yeni istanbul ozel halk otobusleri", label: "YENI ISTANBUL OHO" },
    CompanyRule { matches: "oztas", label: "OZTAS ULASIM" },
    CompanyRule { matches: "ist ozel tasimacilik", label: "IST OZEL TASIMACILIK" },
    CompanyRule { matches: "sile", label: "SILE OTOBÜSLERII" },
    CompanyRule { matches: "cift kat", label: "CIFT KATLILAR" },
    CompanyRule { matches: "kentic", label: "KENTICI CIFT KATLI" },
    CompanyRule { matches: "gunaydin", label: "GUNAYDIN-CIMEN TUR" },
    // Independent operators roll up under the HALK umbrella; the second
    // entry is the ASCII fallback for feeds that pre-strip diacritics.
    CompanyRule { matches: "bağımsız", label: HALK_LABEL },
    CompanyRule { matches: "bagimsiz", label: HALK_LABEL },
];

/// Lowercase, strip diacritics (NFD + drop combining marks), and trim.
#[must_use]
pub fn normalize_text(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Map a raw operator name to its canonical company label.
///
/// Resolution order:
/// 1. The two HALK ULAŞIM alias spellings short-circuit to [`HALK_LABEL`]
///    before the table scan (they appear embedded in otherwise unrelated
///    legal names).
/// 2. First matching rule in [`COMPANY_PRESETS`] wins.
/// 3. Fallback: the upper-cased trimmed input, or [`UNKNOWN_LABEL`] when
///    the input is empty.
///
/// Total: every input produces a non-empty label. Pure; no side effects.
#[must_use]
pub fn map_company_name(name: &str) -> String {
    let raw = name.trim();

    let upper_raw = raw.to_uppercase();
    if upper_raw.contains("HALK ULAŞIM") || upper_raw.contains("HALK ULASIM") {
        return HALK_LABEL.to_owned();
    }

    let key = normalize_text(raw);
    for rule in COMPANY_PRESETS {
        if key.contains(&normalize_text(rule.matches)) {
            return rule.label.to_owned();
        }
    }

    if upper_raw.is_empty() {
        UNKNOWN_LABEL.to_owned()
    } else {
        upper_raw
    }
}

/// Distinct canonical labels present in a fleet snapshot, with vehicle
/// counts, sorted by label. Feeds the company filter chooser.
#[must_use]
pub fn company_options(vehicles: &[VehicleSnapshot]) -> Vec<(String, usize)> {
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for v in vehicles {
        let label = map_company_name(v.operator_type.as_deref().unwrap_or(""));
        *counts.entry(label).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_diacritics_and_case() {
        assert_eq!(normalize_text("  ÖZULAŞ  "), "ozulas");
        assert_eq!(normalize_text("Şile"), "sile");
        assert_eq!(normalize_text("bağımsız"), "bagımsız");
    }

    #[test]
    fn halk_alias_short_circuits() {
        assert_eq!(map_company_name("İSTANBUL HALK ULAŞIM TİC.A.Ş"), HALK_LABEL);
        assert_eq!(map_company_name("istanbul halk ulasim a.s."), HALK_LABEL);
    }

    #[test]
    fn preset_rules_match_substrings() {
        assert_eq!(map_company_name("IETT ISLETMELERI GENEL MUD."), "IETT");
        assert_eq!(map_company_name("Özulaş Toplu Taşım A.Ş."), "OZULAS A.S");
        assert_eq!(map_company_name("mavi marmara otobusleri"), "MAVI MARMARA");
        assert_eq!(map_company_name("GÜNAYDIN TURIZM"), "GUNAYDIN-CIMEN TUR");
    }

    #[test]
    fn independent_operators_roll_up_to_halk() {
        assert_eq!(map_company_name("Bağımsız"), HALK_LABEL);
        assert_eq!(map_company_name("BAGIMSIZ"), HALK_LABEL);
    }

    #[test]
    fn unmatched_names_fall_back_to_uppercase() {
        assert_eq!(map_company_name("  acme transit  "), "ACME TRANSIT");
    }

    #[test]
    fn empty_name_yields_unknown_sentinel() {
        assert_eq!(map_company_name(""), UNKNOWN_LABEL);
        assert_eq!(map_company_name("   "), UNKNOWN_LABEL);
    }

    #[test]
    fn mapping_is_total() {
        for input in ["iett", "x", "ŞİLE", "--", "Özulaş"] {
            assert!(!map_company_name(input).is_empty());
        }
    }

    // Match strings overlap ("cift kat" / "kentic...cift katli" operators,
    // the HALK family). Scanning a reversed table must change at least one
    // answer, otherwise the table could silently become order-insensitive
    // and a later "generic above specific" edit would go unnoticed.
    #[test]
    fn preset_order_is_load_bearing() {
        fn scan<'a>(
            rules: impl Iterator<Item = &'a CompanyRule>,
            input: &str,
        ) -> Option<&'static str> {
            let key = normalize_text(input);
            rules
                .into_iter()
                .find(|r| key.contains(&normalize_text(r.matches)))
                .map(|r| r.label)
        }

        // "kentici cift katli" matches both the "cift kat" and "kentic"
        // rules; forward order picks the earlier, more generic family label.
        let input = "kentici cift katli otobusler";
        let forward = scan(COMPANY_PRESETS.iter(), input);
        let reversed = scan(COMPANY_PRESETS.iter().rev(), input);
        assert_eq!(forward, Some("CIFT KATLILAR"));
        assert_eq!(reversed, Some("KENTICI CIFT KATLI"));
        assert_ne!(forward, reversed);
    }

    #[test]
    fn company_options_counts_and_sorts() {
        let mk = |op: &str| VehicleSnapshot {
            operator_type: Some(op.to_owned()),
            ..VehicleSnapshot::default()
        };
        let fleet = vec![mk("iett"), mk("IETT GENEL"), mk("Özulaş"), mk("")];
        let options = company_options(&fleet);
        assert_eq!(
            options,
            vec![
                (UNKNOWN_LABEL.to_owned(), 1),
                ("IETT".to_owned(), 2),
                ("OZULAS A.S".to_owned(), 1),
            ]
        );
    }
}
