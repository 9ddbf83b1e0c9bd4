use crate::api::musicbrainz::{ReleaseGroupRecord, ReleaseItem};

/// Countries scanned for a representative release, in order. Major
/// English-speaking markets first; a hand-tuned table kept verbatim.
const COUNTRY_PREFERENCE: [&str; 5] = ["US", "GB", "CA", "AU", "JP"];

#[derive(Debug)]
struct Candidate<'a> {
    release_id: &'a str,
    country: &'a str,
    format: &'a str,
}

/// Picks the release whose track listing will represent the release group.
///
/// The catalog exposes no usable canonical-release field, so this makes a
/// deterministic best guess. Official releases with a country are split into
/// two buckets, those whose date matches the group's first release date and
/// the rest, keeping one candidate per country per bucket, with a CD
/// pressing replacing a non-CD one on country ties. The date-matching bucket
/// is searched first, each time in the preferred country order. When nothing
/// matches a preferred country the first release in the unfiltered list is
/// used, so a non-empty release list always yields a pick.
pub fn pick_release(record: &ReleaseGroupRecord) -> Option<&str> {
    let releases = &record.releases;

    if releases.is_empty() {
        return None;
    }

    if releases.len() == 1 {
        return Some(&releases[0].id);
    }

    let mut date_matching: Vec<Candidate<'_>> = Vec::new();
    let mut other_date: Vec<Candidate<'_>> = Vec::new();
    let first_release_date = record.first_release_date.as_deref().unwrap_or("");

    for release in releases {
        let official = release
            .status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("official"));

        let Some(country) = release.country.as_deref() else {
            continue;
        };

        if !official {
            continue;
        }

        let candidate = Candidate {
            release_id: &release.id,
            country,
            format: first_format(release),
        };

        let date_matches =
            !first_release_date.is_empty() && release.date.as_deref() == Some(first_release_date);

        if date_matches {
            insert_candidate(&mut date_matching, candidate);
        } else {
            insert_candidate(&mut other_date, candidate);
        }
    }

    let preferred = pick_by_country(&date_matching).or_else(|| pick_by_country(&other_date));

    Some(preferred.unwrap_or(&releases[0].id))
}

fn first_format(release: &ReleaseItem) -> &str {
    release
        .media
        .first()
        .and_then(|medium| medium.format.as_deref())
        .unwrap_or("")
}

fn insert_candidate<'a>(bucket: &mut Vec<Candidate<'a>>, candidate: Candidate<'a>) {
    if let Some(existing) = bucket
        .iter_mut()
        .find(|existing| existing.country == candidate.country)
    {
        // One candidate per country; a CD pressing displaces a non-CD one.
        if existing.format != "CD" && candidate.format == "CD" {
            existing.release_id = candidate.release_id;
            existing.format = candidate.format;
        }
        return;
    }

    bucket.push(candidate);
}

fn pick_by_country<'a>(candidates: &[Candidate<'a>]) -> Option<&'a str> {
    COUNTRY_PREFERENCE.iter().find_map(|country| {
        candidates
            .iter()
            .find(|candidate| &candidate.country == country)
            .map(|candidate| candidate.release_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::musicbrainz::Medium;

    fn release(id: &str, status: Option<&str>, country: Option<&str>, date: Option<&str>) -> ReleaseItem {
        ReleaseItem {
            id: id.to_string(),
            status: status.map(String::from),
            country: country.map(String::from),
            date: date.map(String::from),
            ..ReleaseItem::default()
        }
    }

    fn release_with_format(
        id: &str,
        country: &str,
        date: &str,
        format: &str,
    ) -> ReleaseItem {
        let mut item = release(id, Some("Official"), Some(country), Some(date));
        item.media = vec![Medium {
            format: Some(format.to_string()),
            ..Medium::default()
        }];
        item
    }

    fn record(first_release_date: &str, releases: Vec<ReleaseItem>) -> ReleaseGroupRecord {
        ReleaseGroupRecord {
            id: "rg1".to_string(),
            first_release_date: Some(first_release_date.to_string()),
            releases,
            ..ReleaseGroupRecord::default()
        }
    }

    #[test]
    fn a_single_release_is_used_whatever_its_fields_say() {
        let record = record(
            "1990-01-01",
            vec![release("r1", Some("Bootleg"), None, None)],
        );

        assert_eq!(pick_release(&record), Some("r1"));
    }

    #[test]
    fn an_empty_release_list_yields_nothing() {
        let record = record("1990-01-01", Vec::new());
        assert_eq!(pick_release(&record), None);
    }

    #[test]
    fn us_wins_over_gb_when_both_match_the_first_release_date() {
        let record = record(
            "1990-01-01",
            vec![
                release("r-gb", Some("Official"), Some("GB"), Some("1990-01-01")),
                release("r-us", Some("Official"), Some("US"), Some("1990-01-01")),
            ],
        );

        assert_eq!(pick_release(&record), Some("r-us"));
    }

    #[test]
    fn a_date_matching_country_beats_a_better_country_with_the_wrong_date() {
        // GB matches the first release date; the US pressing is a reissue.
        let record = record(
            "1990-01-01",
            vec![
                release("r-us", Some("Official"), Some("US"), Some("1995-03-01")),
                release("r-gb", Some("Official"), Some("GB"), Some("1990-01-01")),
            ],
        );

        assert_eq!(pick_release(&record), Some("r-gb"));
    }

    #[test]
    fn the_other_date_bucket_is_searched_when_no_date_matches() {
        let record = record(
            "1990-01-01",
            vec![
                release("r-ca", Some("Official"), Some("CA"), Some("1991-06-01")),
                release("r-jp", Some("Official"), Some("JP"), Some("1991-06-01")),
            ],
        );

        assert_eq!(pick_release(&record), Some("r-ca"));
    }

    #[test]
    fn falls_back_to_the_first_release_when_no_preferred_country_matches() {
        let record = record(
            "1990-01-01",
            vec![
                release("r-de", Some("Official"), Some("DE"), Some("1990-01-01")),
                release("r-fr", Some("Official"), Some("FR"), Some("1990-01-01")),
            ],
        );

        assert_eq!(pick_release(&record), Some("r-de"));
    }

    #[test]
    fn unofficial_and_countryless_releases_never_become_candidates() {
        let record = record(
            "1990-01-01",
            vec![
                release("r-boot", Some("Bootleg"), Some("US"), Some("1990-01-01")),
                release("r-nowhere", Some("Official"), None, Some("1990-01-01")),
                release("r-gb", Some("Official"), Some("GB"), Some("1990-01-01")),
            ],
        );

        assert_eq!(pick_release(&record), Some("r-gb"));
    }

    #[test]
    fn a_cd_pressing_displaces_a_non_cd_one_for_the_same_country() {
        let record = record(
            "1990-01-01",
            vec![
                release_with_format("r-vinyl", "US", "1990-01-01", "12\" Vinyl"),
                release_with_format("r-cd", "US", "1990-01-01", "CD"),
            ],
        );

        assert_eq!(pick_release(&record), Some("r-cd"));
    }

    #[test]
    fn a_second_non_cd_pressing_does_not_displace_the_first() {
        let record = record(
            "1990-01-01",
            vec![
                release_with_format("r-first", "US", "1990-01-01", "12\" Vinyl"),
                release_with_format("r-cassette", "US", "1990-01-01", "Cassette"),
            ],
        );

        assert_eq!(pick_release(&record), Some("r-first"));
    }
}
