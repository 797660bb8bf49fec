//! Country/region validation data.
//!
//! Countries with a known region list require the submitted region to be a
//! member; a mismatch is rejected, never corrected. Countries not listed
//! here accept any non-empty region.

/// Region codes per country, for the countries the storefront ships to
/// with structured region data.
static REGIONS: &[(&str, &[&str])] = &[
    (
        "US",
        &[
            "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL",
            "IN", "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE",
            "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD",
            "TN", "TX", "UT", "VT", "VA", "WA", "WV", "WI", "WY",
        ],
    ),
    (
        "CA",
        &[
            "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
        ],
    ),
    ("AU", &["ACT", "NSW", "NT", "QLD", "SA", "TAS", "VIC", "WA"]),
];

/// Region list for a country code, if the storefront knows one.
///
/// Lookup is case-insensitive on the country code.
#[must_use]
pub fn regions_for(country: &str) -> Option<&'static [&'static str]> {
    let country = country.trim().to_ascii_uppercase();
    REGIONS
        .iter()
        .find(|(code, _)| *code == country)
        .map(|(_, regions)| *regions)
}

/// Whether the submitted region is acceptable for the country.
///
/// Countries without a known region list accept any region string; the
/// presence check happens separately during field validation.
#[must_use]
pub fn is_valid_region(country: &str, region: &str) -> bool {
    let Some(regions) = regions_for(country) else {
        return true;
    };
    let region = region.trim().to_ascii_uppercase();
    regions.contains(&region.as_str())
}
