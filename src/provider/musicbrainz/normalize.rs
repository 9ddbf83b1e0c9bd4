use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::api::musicbrainz::{
    ArtistCredit, ArtistRecord, ArtistSearchResponse, Medium, RecordingRecord,
    RecordingSearchResponse, RelationItem, ReleaseGroupBrowseResponse, ReleaseGroupItem,
    ReleaseGroupRecord, ReleaseGroupSearchResponse, ReleaseItem, TagItem,
};
use crate::models::{
    Album, Area, Artist, Discography, EntityKind, Image, LifeSpan, Link, Member, SearchOutput,
    SearchResult, Song, Tag, Track, TrackList,
};

/// Near-universal labels that add no information; dropped from every tag and
/// genre list outright.
const EXCLUDED_TAGS: &[&str] = &["1–9 wochen", "offizielle charts", "aln-sh"];

/// Reported search totals are capped so callers are never handed a
/// pagination total implying more pages than the engine will serve.
pub const MAX_SEARCH_COUNT: u32 = 200;

/// The outcome of scanning an entity's URL relations: the curated links plus
/// the wikidata target, which is never surfaced as a link itself. It drives
/// the description lookup instead.
#[derive(Debug, Clone, Default)]
pub struct CuratedLinks {
    pub links: Vec<Link>,
    pub wikidata_url: Option<String>,
}

/// Sorts tags by descending popularity count and drops excluded names.
pub fn build_tag_list(items: &[TagItem]) -> Vec<Tag> {
    let mut sorted: Vec<&TagItem> = items.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));

    sorted
        .into_iter()
        .filter(|item| !EXCLUDED_TAGS.contains(&item.name.as_str()))
        .map(|item| Tag {
            id: item.id.clone(),
            name: item.name.clone(),
        })
        .collect()
}

/// Curates the URL relations of a record into display links.
///
/// Each recognized relation type maps through a fixed label and ordinal
/// table; unrecognized types are dropped, and only the first fan page is
/// kept. A source credit on the relation is appended to the label.
pub fn build_link_list(relations: &[RelationItem]) -> CuratedLinks {
    let mut result = CuratedLinks::default();
    let mut fan_page_found = false;

    for relation in relations {
        let Some(url) = &relation.url else {
            continue;
        };

        if relation.relation_type == "wikidata" {
            result.wikidata_url = Some(url.resource.clone());
            continue;
        }

        let (label, ordinal) = match relation.relation_type.as_str() {
            "allmusic" => ("All Music", 1),
            "discogs" => ("Discogs", 2),
            "songkick" => ("Songkick", 4),
            "setlistfm" => ("Setlist.fm", 5),
            "fanpage" => {
                if fan_page_found {
                    continue;
                }
                fan_page_found = true;
                ("Fan page", 6)
            }
            "other databases" => {
                if url.resource.contains("rateyourmusic.com") {
                    ("Rate Your Music", 3)
                } else {
                    continue;
                }
            }
            _ => continue,
        };

        let label = match &relation.source_credit {
            Some(credit) if !credit.is_empty() => format!("{label} ({credit})"),
            _ => label.to_string(),
        };

        result.links.push(Link {
            label,
            target: url.resource.clone(),
            ordinal,
        });
    }

    result.links.sort_by_key(|link| link.ordinal);
    result
}

/// Collects band members from an artist's relations: only "member of band"
/// relations pointing at person-typed artists count, deduplicated
/// case-insensitively by name and sorted alphabetically.
pub fn build_members(relations: &[RelationItem]) -> Vec<Member> {
    let mut members: Vec<Member> = Vec::new();

    for relation in relations {
        if !relation.relation_type.eq_ignore_ascii_case("member of band") {
            continue;
        }

        let Some(artist) = &relation.artist else {
            continue;
        };

        let is_person = artist
            .artist_type
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("person"));
        if !is_person {
            continue;
        }

        let name_key = artist.name.to_lowercase();
        if members.iter().any(|m| m.name.to_lowercase() == name_key) {
            continue;
        }

        members.push(Member {
            id: artist.id.clone(),
            name: artist.name.clone(),
            life_span: LifeSpan {
                begin: relation.begin.clone().unwrap_or_default(),
                end: relation.end.clone().unwrap_or_default(),
                ended: relation.ended.unwrap_or(false),
            },
        });
    }

    members.sort_by(|a, b| a.name.cmp(&b.name));
    members
}

pub fn build_artist_search(data: &ArtistSearchResponse) -> SearchOutput {
    let rows = data
        .artists
        .iter()
        .map(|artist| SearchResult {
            entity_type: EntityKind::Artist,
            id: artist.id.clone(),
            name: artist.name.clone(),
            score: artist.score,
            tags: build_tag_list(&artist.tags),
            ..SearchResult::default()
        })
        .collect();

    SearchOutput {
        rows,
        count: data.count.min(MAX_SEARCH_COUNT),
    }
}

pub fn build_album_search(data: &ReleaseGroupSearchResponse) -> SearchOutput {
    let rows = data
        .release_groups
        .iter()
        .map(|group| SearchResult {
            entity_type: EntityKind::Album,
            id: group.id.clone(),
            name: group.title.clone(),
            artist: credit_phrase(&group.artist_credit),
            artist_id: first_credit_id(&group.artist_credit),
            score: group.score,
            tags: build_tag_list(&group.tags),
            ..SearchResult::default()
        })
        .collect();

    SearchOutput {
        rows,
        count: data.count.min(MAX_SEARCH_COUNT),
    }
}

pub fn build_song_search(data: &RecordingSearchResponse) -> SearchOutput {
    let rows = data
        .recordings
        .iter()
        .map(|recording| SearchResult {
            entity_type: EntityKind::Song,
            id: recording.id.clone(),
            name: recording.title.clone(),
            artist: credit_phrase(&recording.artist_credit),
            artist_id: first_credit_id(&recording.artist_credit),
            album: recording
                .releases
                .first()
                .map(|release| release.title.clone())
                .unwrap_or_default(),
            score: recording.score,
            tags: build_tag_list(&recording.tags),
        })
        .collect();

    SearchOutput {
        rows,
        count: data.count.min(MAX_SEARCH_COUNT),
    }
}

/// Assembles the canonical artist from the joined lookup results.
pub fn build_artist(
    record: &ArtistRecord,
    albums_record: &ReleaseGroupBrowseResponse,
    artist_images: Vec<Image>,
    album_images: &HashMap<String, Vec<Image>>,
    links: Vec<Link>,
    description: String,
) -> Artist {
    Artist {
        id: record.id.clone(),
        name: record.name.clone(),
        artist_type: record.artist_type.clone().unwrap_or_default(),
        life_span: LifeSpan {
            begin: record.life_span.begin.clone().unwrap_or_default(),
            end: record.life_span.end.clone().unwrap_or_default(),
            ended: record.life_span.ended.unwrap_or(false),
        },
        area: record.area.as_ref().map(|area| Area {
            name: area.name.clone(),
        }),
        begin_area: record.begin_area.as_ref().map(|area| Area {
            name: area.name.clone(),
        }),
        end_area: record.end_area.as_ref().map(|area| Area {
            name: area.name.clone(),
        }),
        comment: record.disambiguation.clone(),
        annotation: record.annotation.clone().unwrap_or_default(),
        tags: build_tag_list(&record.tags),
        genres: build_tag_list(&record.genres),
        images: artist_images,
        albums: build_album_rows(&albums_record.release_groups, true, album_images),
        total_albums: albums_record.release_group_count,
        members: build_members(&record.relations),
        links,
        description,
    }
}

/// Assembles the canonical album from its release-group record. The track
/// list is attached separately once the canonical release is resolved.
pub fn build_album(
    record: &ReleaseGroupRecord,
    album_images: &HashMap<String, Vec<Image>>,
    links: Vec<Link>,
    description: String,
) -> Album {
    Album {
        id: record.id.clone(),
        name: record.title.clone(),
        album_type: record.primary_type.clone().unwrap_or_default(),
        artist: first_credit_name(&record.artist_credit),
        artist_id: first_credit_id(&record.artist_credit),
        release_date: record.first_release_date.clone().unwrap_or_default(),
        tags: build_tag_list(&record.tags),
        genres: build_tag_list(&record.genres),
        images: cover_images(&record.id, album_images),
        links,
        description,
        ..Album::default()
    }
}

/// Assembles the canonical song from its recording record and the releases
/// it appears on.
pub fn build_song(
    record: &RecordingRecord,
    releases: &[ReleaseItem],
    links: Vec<Link>,
    description: String,
) -> Song {
    let groups = dedup_release_groups(releases);
    let albums = build_album_rows(&groups, false, &HashMap::new());

    let release_date = albums
        .iter()
        .map(|album| album.release_date.as_str())
        .filter(|date| !date.is_empty())
        .min_by(|a, b| compare_dates(a, b))
        .unwrap_or_default()
        .to_string();

    Song {
        id: record.id.clone(),
        name: record.title.clone(),
        duration: record.length.map(format_duration).unwrap_or_default(),
        artist: first_credit_name(&record.artist_credit),
        artist_id: first_credit_id(&record.artist_credit),
        release_date,
        tags: build_tag_list(&record.tags),
        genres: build_tag_list(&record.genres),
        annotation: record.annotation.clone().unwrap_or_default(),
        albums,
        links,
        description,
    }
}

/// Assembles one discography page from browsed release groups.
pub fn build_discography(
    groups: &[ReleaseGroupItem],
    total: u32,
    album_only: bool,
    album_images: &HashMap<String, Vec<Image>>,
) -> Discography {
    Discography {
        rows: build_album_rows(groups, album_only, album_images),
        count: total,
    }
}

/// Collapses a release browse down to its distinct release groups. Browsing
/// from a song yields releases, which can repeat the same release group many
/// times; the first occurrence wins.
pub fn dedup_release_groups(releases: &[ReleaseItem]) -> Vec<ReleaseGroupItem> {
    let mut groups: Vec<ReleaseGroupItem> = Vec::new();

    for release in releases {
        let Some(group) = &release.release_group else {
            continue;
        };

        if groups.iter().any(|existing| existing.id == group.id) {
            continue;
        }

        groups.push(group.clone());
    }

    groups
}

/// Builds album rows from release groups: optional filter to plain albums,
/// dense ordinals in survival order, cover image attachment, and a final
/// sort by release date ascending.
fn build_album_rows(
    groups: &[ReleaseGroupItem],
    album_only: bool,
    album_images: &HashMap<String, Vec<Image>>,
) -> Vec<Album> {
    let mut albums: Vec<Album> = Vec::new();
    let mut ordinal = 0;

    for group in groups {
        if album_only {
            let is_album = group
                .primary_type
                .as_deref()
                .is_some_and(|kind| kind.eq_ignore_ascii_case("album"));
            if !is_album {
                continue;
            }
        }

        let album = Album {
            id: group.id.clone(),
            name: group.title.clone(),
            album_type: group.primary_type.clone().unwrap_or_default(),
            release_date: group.first_release_date.clone().unwrap_or_default(),
            ordinal,
            images: cover_images(&group.id, album_images),
            ..Album::default()
        };

        ordinal += 1;
        albums.push(album);
    }

    albums.sort_by(|a, b| compare_dates(&a.release_date, &b.release_date));
    albums
}

/// Builds the track list for one medium, with per-track durations and the
/// medium's aggregate duration.
pub fn build_track_list(medium: &Medium) -> TrackList {
    let mut tracks = Vec::new();
    let mut total_ms: i64 = 0;

    for item in &medium.tracks {
        let length = item.length.or(item.recording.length);

        if let Some(length) = length {
            total_ms += length;
        }

        tracks.push(Track {
            id: item.id.clone(),
            name: item.recording.title.clone(),
            artist: first_credit_name(&item.artist_credit),
            artist_id: first_credit_id(&item.artist_credit),
            duration: length.map(format_duration).unwrap_or_default(),
        });
    }

    TrackList {
        tracks,
        total_duration: if total_ms > 0 {
            format_duration(total_ms)
        } else {
            String::new()
        },
        position: medium.position,
        format: medium.format.clone().unwrap_or_default(),
    }
}

/// Formats a millisecond length as `M:SS`, or `H:MM:SS` from one hour up.
pub fn format_duration(length_ms: i64) -> String {
    let total_seconds = (length_ms + 500) / 1000;
    let hours = total_seconds / 3600;
    let seconds = total_seconds % 60;

    if hours >= 1 {
        let minutes = (total_seconds % 3600) / 60;
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        let minutes = total_seconds / 60;
        format!("{minutes}:{seconds:02}")
    }
}

/// Joins artist credits into a display phrase ("A & B", "A feat. B").
pub fn credit_phrase(credits: &[ArtistCredit]) -> String {
    let mut phrase = String::new();

    for credit in credits {
        phrase.push_str(&credit.name);
        phrase.push_str(&credit.joinphrase);
    }

    phrase
}

fn first_credit_name(credits: &[ArtistCredit]) -> String {
    credits
        .first()
        .map(|credit| credit.artist.name.clone())
        .unwrap_or_default()
}

fn first_credit_id(credits: &[ArtistCredit]) -> String {
    credits
        .first()
        .map(|credit| credit.artist.id.clone())
        .unwrap_or_default()
}

fn cover_images(album_id: &str, album_images: &HashMap<String, Vec<Image>>) -> Vec<Image> {
    match album_images.get(album_id).and_then(|images| images.first()) {
        Some(image) => vec![image.clone()],
        None => Vec::new(),
    }
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    parse_date(a).cmp(&parse_date(b)).then_with(|| a.cmp(b))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if value.len() == 7 {
        let padded = format!("{value}-01");
        return NaiveDate::parse_from_str(&padded, "%Y-%m-%d").ok();
    }

    if value.len() == 4 {
        if let Ok(year) = value.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::musicbrainz::{ArtistRef, UrlResource};

    fn tag(name: &str, count: u32) -> TagItem {
        TagItem {
            id: None,
            name: name.to_string(),
            count,
        }
    }

    fn url_relation(relation_type: &str, target: &str) -> RelationItem {
        RelationItem {
            relation_type: relation_type.to_string(),
            target_type: Some("url".to_string()),
            url: Some(UrlResource {
                resource: target.to_string(),
            }),
            ..RelationItem::default()
        }
    }

    fn member_relation(name: &str, artist_type: &str) -> RelationItem {
        RelationItem {
            relation_type: "member of band".to_string(),
            target_type: Some("artist".to_string()),
            artist: Some(ArtistRef {
                id: format!("id-{name}"),
                name: name.to_string(),
                artist_type: Some(artist_type.to_string()),
            }),
            ..RelationItem::default()
        }
    }

    fn group(id: &str, title: &str, primary_type: Option<&str>, date: &str) -> ReleaseGroupItem {
        ReleaseGroupItem {
            id: id.to_string(),
            title: title.to_string(),
            primary_type: primary_type.map(String::from),
            first_release_date: if date.is_empty() {
                None
            } else {
                Some(date.to_string())
            },
            ..ReleaseGroupItem::default()
        }
    }

    #[test]
    fn tags_sort_by_descending_count() {
        let tags = build_tag_list(&[tag("rock", 5), tag("pop", 10)]);
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["pop", "rock"]);
    }

    #[test]
    fn excluded_tags_are_dropped_regardless_of_count() {
        let tags = build_tag_list(&[tag("offizielle charts", 99), tag("rock", 1)]);
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["rock"]);
    }

    #[test]
    fn tag_ids_are_preserved() {
        let mut genre = tag("synth-pop", 3);
        genre.id = Some("g1".to_string());
        let tags = build_tag_list(&[genre]);
        assert_eq!(tags[0].id.as_deref(), Some("g1"));
    }

    #[test]
    fn links_sort_by_ordinal_not_upstream_order() {
        let curated = build_link_list(&[
            url_relation("discogs", "https://www.discogs.com/artist/1"),
            url_relation("songkick", "https://www.songkick.com/artists/1"),
            url_relation("allmusic", "https://www.allmusic.com/artist/1"),
        ]);

        let labels: Vec<_> = curated.links.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["All Music", "Discogs", "Songkick"]);
        let ordinals: Vec<_> = curated.links.iter().map(|l| l.ordinal).collect();
        assert_eq!(ordinals, [1, 2, 4]);
    }

    #[test]
    fn wikidata_relations_feed_the_description_not_the_links() {
        let curated = build_link_list(&[url_relation(
            "wikidata",
            "https://www.wikidata.org/wiki/Q42",
        )]);

        assert!(curated.links.is_empty());
        assert_eq!(
            curated.wikidata_url.as_deref(),
            Some("https://www.wikidata.org/wiki/Q42")
        );
    }

    #[test]
    fn only_the_first_fan_page_survives() {
        let curated = build_link_list(&[
            url_relation("fanpage", "http://fans.example/one"),
            url_relation("fanpage", "http://fans.example/two"),
        ]);

        assert_eq!(curated.links.len(), 1);
        assert_eq!(curated.links[0].target, "http://fans.example/one");
    }

    #[test]
    fn other_databases_only_match_rate_your_music() {
        let curated = build_link_list(&[
            url_relation("other databases", "https://rateyourmusic.com/artist/x"),
            url_relation("other databases", "https://some-database.example/x"),
        ]);

        assert_eq!(curated.links.len(), 1);
        assert_eq!(curated.links[0].label, "Rate Your Music");
        assert_eq!(curated.links[0].ordinal, 3);
    }

    #[test]
    fn unrecognized_relation_types_are_dropped() {
        let curated = build_link_list(&[
            url_relation("youtube", "https://youtube.com/c/x"),
            url_relation("allmusic", "https://www.allmusic.com/artist/1"),
        ]);

        assert_eq!(curated.links.len(), 1);
    }

    #[test]
    fn source_credit_is_appended_to_the_label() {
        let mut relation = url_relation("discogs", "https://www.discogs.com/artist/1");
        relation.source_credit = Some("import".to_string());

        let curated = build_link_list(&[relation]);
        assert_eq!(curated.links[0].label, "Discogs (import)");
    }

    #[test]
    fn members_dedup_case_insensitively_and_sort_by_name() {
        let members = build_members(&[
            member_relation("zoe example", "Person"),
            member_relation("Alex Example", "Person"),
            member_relation("ZOE EXAMPLE", "Person"),
        ]);

        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Alex Example", "zoe example"]);
    }

    #[test]
    fn group_typed_relations_are_not_members() {
        let members = build_members(&[member_relation("Side Project", "Group")]);
        assert!(members.is_empty());
    }

    #[test]
    fn member_life_span_comes_from_the_relation() {
        let mut relation = member_relation("Alex Example", "Person");
        relation.begin = Some("1981".to_string());
        relation.end = Some("1989".to_string());
        relation.ended = Some(true);

        let members = build_members(&[relation]);
        assert_eq!(members[0].life_span.begin, "1981");
        assert_eq!(members[0].life_span.end, "1989");
        assert!(members[0].life_span.ended);
    }

    #[test]
    fn search_count_is_capped() {
        let data = ArtistSearchResponse {
            artists: Vec::new(),
            count: 5000,
        };

        assert_eq!(build_artist_search(&data).count, MAX_SEARCH_COUNT);
    }

    #[test]
    fn search_count_below_the_cap_passes_through() {
        let data = ArtistSearchResponse {
            artists: Vec::new(),
            count: 37,
        };

        assert_eq!(build_artist_search(&data).count, 37);
    }

    #[test]
    fn album_rows_filter_to_albums_and_keep_survival_ordinals() {
        let groups = [
            group("rg1", "Early Album", Some("Album"), "1991-02-01"),
            group("rg2", "A Single", Some("Single"), "1992-01-01"),
            group("rg3", "Later Album", Some("Album"), "1990-05-01"),
        ];

        let rows = build_album_rows(&groups, true, &HashMap::new());

        // Ordinals reflect the order rows survived filtering; the final list
        // is sorted by release date.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "rg3");
        assert_eq!(rows[0].ordinal, 1);
        assert_eq!(rows[1].id, "rg1");
        assert_eq!(rows[1].ordinal, 0);
    }

    #[test]
    fn album_rows_attach_the_first_matching_cover() {
        let groups = [group("rg1", "Album", Some("Album"), "1991-02-01")];
        let mut images = HashMap::new();
        images.insert(
            "rg1".to_string(),
            vec![Image::new("http://img/a.jpg"), Image::new("http://img/b.jpg")],
        );

        let rows = build_album_rows(&groups, true, &images);
        assert_eq!(rows[0].images.len(), 1);
        assert_eq!(rows[0].images[0].url, "http://img/a.jpg");
    }

    #[test]
    fn discography_from_a_song_dedups_release_groups() {
        let release = |id: &str, rg: ReleaseGroupItem| ReleaseItem {
            id: id.to_string(),
            release_group: Some(rg),
            ..ReleaseItem::default()
        };

        let shared = group("rg1", "The Album", Some("Album"), "1999-01-01");
        let releases = [
            release("r1", shared.clone()),
            release("r2", shared.clone()),
            release("r3", shared.clone()),
        ];

        let groups = dedup_release_groups(&releases);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "rg1");
    }

    #[test]
    fn track_durations_format_as_minutes_and_seconds() {
        assert_eq!(format_duration(83_000), "1:23");
        assert_eq!(format_duration(59_900), "1:00");
        assert_eq!(format_duration(3_599_000), "59:59");
    }

    #[test]
    fn hour_long_durations_gain_an_hours_field() {
        assert_eq!(format_duration(3_600_000), "1:00:00");
        assert_eq!(format_duration(5_025_000), "1:23:45");
    }

    #[test]
    fn build_track_list_aggregates_the_medium_duration() {
        use crate::api::musicbrainz::{RecordingStub, TrackItem};

        let track = |id: &str, title: &str, length: i64| TrackItem {
            id: id.to_string(),
            length: Some(length),
            recording: RecordingStub {
                id: format!("rec-{id}"),
                title: title.to_string(),
                length: Some(length),
            },
            ..TrackItem::default()
        };

        let medium = Medium {
            position: 1,
            format: Some("CD".to_string()),
            track_count: 2,
            tracks: vec![track("t1", "Opener", 125_000), track("t2", "Closer", 95_000)],
        };

        let list = build_track_list(&medium);
        assert_eq!(list.tracks.len(), 2);
        assert_eq!(list.tracks[0].name, "Opener");
        assert_eq!(list.tracks[0].duration, "2:05");
        assert_eq!(list.total_duration, "3:40");
        assert_eq!(list.format, "CD");
    }

    #[test]
    fn song_release_date_is_the_earliest_album_date() {
        let release = |id: &str, rg: ReleaseGroupItem| ReleaseItem {
            id: id.to_string(),
            release_group: Some(rg),
            ..ReleaseItem::default()
        };

        let record = RecordingRecord {
            id: "rec1".to_string(),
            title: "The Song".to_string(),
            length: Some(200_000),
            ..RecordingRecord::default()
        };

        let releases = [
            release("r1", group("rg1", "Reissue", Some("Album"), "2001-05-01")),
            release("r2", group("rg2", "Original", Some("Album"), "1984-11-19")),
        ];

        let song = build_song(&record, &releases, Vec::new(), String::new());
        assert_eq!(song.release_date, "1984-11-19");
        assert_eq!(song.duration, "3:20");
        assert_eq!(song.albums.len(), 2);
    }

    #[test]
    fn credit_phrase_joins_with_the_upstream_joinphrase() {
        let credit = |name: &str, join: &str| ArtistCredit {
            name: name.to_string(),
            joinphrase: join.to_string(),
            artist: ArtistRef::default(),
        };

        let phrase = credit_phrase(&[credit("First", " & "), credit("Second", "")]);
        assert_eq!(phrase, "First & Second");
    }
}
