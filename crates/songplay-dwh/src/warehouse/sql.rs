//! SQL statements for the staging tables and the songplay star schema

use songplay_common::Settings;

/// Tables in creation order: staging first, then fact, then dimensions
pub const TABLES: [&str; 7] = [
    "staging_events",
    "staging_songs",
    "songplay",
    "users",
    "song",
    "artist",
    "time",
];

pub const STAGING_EVENTS_DROP: &str = "DROP TABLE IF EXISTS staging_events;";
pub const STAGING_SONGS_DROP: &str = "DROP TABLE IF EXISTS staging_songs;";
pub const SONGPLAY_DROP: &str = "DROP TABLE IF EXISTS songplay;";
pub const USERS_DROP: &str = "DROP TABLE IF EXISTS users;";
pub const SONG_DROP: &str = "DROP TABLE IF EXISTS song;";
pub const ARTIST_DROP: &str = "DROP TABLE IF EXISTS artist;";
pub const TIME_DROP: &str = "DROP TABLE IF EXISTS time;";

/// Raw log events; column names match the JSONPaths file
pub const STAGING_EVENTS_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS staging_events (
    artist        varchar,
    auth          varchar(12),
    firstName     varchar,
    gender        varchar(1),
    itemInSession int,
    lastName      varchar,
    length        float,
    level         varchar(8),
    location      varchar,
    method        varchar(8),
    page          varchar,
    registration  float,
    sessionId     int,
    song          varchar,
    status        int,
    ts            bigint,
    userAgent     varchar,
    userId        int
);
"#;

/// Song metadata; loaded with `'auto'` so names match the JSON keys
pub const STAGING_SONGS_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS staging_songs (
    num_songs        int,
    artist_id        varchar,
    artist_latitude  float,
    artist_longitude float,
    artist_location  varchar,
    artist_name      varchar,
    song_id          varchar,
    title            varchar,
    duration         float,
    year             int
);
"#;

pub const SONGPLAY_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS songplay (
    songplay_id int IDENTITY(0,1) DISTKEY,
    start_time  timestamp NOT NULL,
    user_id     varchar NOT NULL,
    level       varchar NOT NULL,
    song_id     varchar,
    artist_id   varchar,
    session_id  varchar NOT NULL,
    location    varchar NOT NULL,
    user_agent  varchar NOT NULL,
    PRIMARY KEY (songplay_id)
)
SORTKEY (start_time, session_id);
"#;

pub const USERS_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id    varchar NOT NULL SORTKEY,
    first_name varchar NOT NULL,
    last_name  varchar NOT NULL,
    gender     varchar,
    level      varchar NOT NULL,
    PRIMARY KEY (user_id)
);
"#;

pub const SONG_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS song (
    song_id   varchar NOT NULL DISTKEY,
    title     varchar NOT NULL,
    artist_id varchar NOT NULL,
    year      int SORTKEY,
    duration  float,
    PRIMARY KEY (song_id)
);
"#;

pub const ARTIST_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS artist (
    artist_id varchar NOT NULL,
    name      varchar NOT NULL,
    location  varchar,
    latitude  float,
    longitude float,
    PRIMARY KEY (artist_id)
);
"#;

pub const TIME_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS time (
    start_time timestamp NOT NULL SORTKEY,
    hour       int NOT NULL,
    day        int NOT NULL,
    week       int NOT NULL,
    month      int NOT NULL,
    year       int NOT NULL,
    weekday    int NOT NULL,
    PRIMARY KEY (start_time)
);
"#;

/// Fact rows: each event joined to the song with the same title.
///
/// Titles are not unique, so an event can match several songs (and pick up
/// the wrong artist). Kept as-is; the staging data carries no better key.
pub const SONGPLAY_INSERT: &str = r#"
INSERT INTO songplay (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT
    TIMESTAMP 'epoch' + ts * INTERVAL '0.001 seconds' AS start_time,
    userid,
    level,
    staging_songs.song_id,
    staging_songs.artist_id,
    sessionid,
    location,
    useragent
FROM staging_events
INNER JOIN staging_songs
    ON staging_songs.title = staging_events.song;
"#;

pub const USERS_INSERT: &str = r#"
INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT DISTINCT
    userid,
    firstname,
    lastname,
    gender,
    level
FROM staging_events
WHERE userid IS NOT NULL;
"#;

pub const SONG_INSERT: &str = r#"
INSERT INTO song (song_id, title, artist_id, year, duration)
SELECT DISTINCT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM staging_songs
WHERE song_id IS NOT NULL;
"#;

pub const ARTIST_INSERT: &str = r#"
INSERT INTO artist (artist_id, name, location, latitude, longitude)
SELECT DISTINCT
    artist_id,
    artist_name,
    artist_location,
    artist_latitude,
    artist_longitude
FROM staging_songs
WHERE artist_id IS NOT NULL;
"#;

/// Reads from `songplay`, so it must run after the fact insert
pub const TIME_INSERT: &str = r#"
INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT
    start_time,
    extract(hour from start_time)    AS hour,
    extract(day from start_time)     AS day,
    extract(week from start_time)    AS week,
    extract(month from start_time)   AS month,
    extract(year from start_time)    AS year,
    extract(weekday from start_time) AS weekday
FROM songplay;
"#;

pub const DROP_TABLE_QUERIES: [&str; 7] = [
    STAGING_EVENTS_DROP,
    STAGING_SONGS_DROP,
    SONGPLAY_DROP,
    USERS_DROP,
    SONG_DROP,
    ARTIST_DROP,
    TIME_DROP,
];

pub const CREATE_TABLE_QUERIES: [&str; 7] = [
    STAGING_EVENTS_CREATE,
    STAGING_SONGS_CREATE,
    SONGPLAY_CREATE,
    USERS_CREATE,
    SONG_CREATE,
    ARTIST_CREATE,
    TIME_CREATE,
];

pub const INSERT_TABLE_QUERIES: [&str; 5] = [
    SONGPLAY_INSERT,
    USERS_INSERT,
    SONG_INSERT,
    ARTIST_INSERT,
    TIME_INSERT,
];

/// Where the COPY statements read from, and with which role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySource {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    /// Region of the source bucket, not of the cluster
    pub region: String,
    pub role_arn: String,
}

impl CopySource {
    pub fn from_settings(settings: &Settings, role_arn: &str) -> Self {
        Self {
            log_data: settings.s3.log_data.clone(),
            log_jsonpath: settings.s3.log_jsonpath.clone(),
            song_data: settings.s3.song_data.clone(),
            region: settings.s3.region.clone(),
            role_arn: role_arn.to_string(),
        }
    }
}

/// Quote a value as a SQL string literal
fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn copy_statement(table: &str, from: &str, format: &str, source: &CopySource) -> String {
    format!(
        "COPY {table}\nFROM {from}\nCREDENTIALS {credentials}\nFORMAT AS JSON {format}\nCOMPUPDATE OFF\nREGION {region};",
        from = literal(from),
        credentials = literal(&format!("aws_iam_role={}", source.role_arn)),
        region = literal(&source.region),
    )
}

/// COPY into `staging_events`, mapping fields through the JSONPaths file
pub fn staging_events_copy(source: &CopySource) -> String {
    copy_statement(
        "staging_events",
        &source.log_data,
        &literal(&source.log_jsonpath),
        source,
    )
}

/// COPY into `staging_songs`, matching fields to columns by name
pub fn staging_songs_copy(source: &CopySource) -> String {
    copy_statement("staging_songs", &source.song_data, "'auto'", source)
}

/// Both COPY statements, events first
pub fn copy_table_queries(source: &CopySource) -> [String; 2] {
    [staging_events_copy(source), staging_songs_copy(source)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use songplay_test_utils::test_settings;

    const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";

    fn source() -> CopySource {
        CopySource::from_settings(&test_settings(), ROLE_ARN)
    }

    #[test]
    fn drop_and_create_cover_every_table_in_order() {
        for (i, table) in TABLES.iter().enumerate() {
            assert_eq!(DROP_TABLE_QUERIES[i], format!("DROP TABLE IF EXISTS {table};"));
            assert!(
                CREATE_TABLE_QUERIES[i].contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "create statement {i} is not for {table}"
            );
        }
    }

    #[test]
    fn inserts_run_fact_first_and_time_last() {
        let targets: Vec<_> = INSERT_TABLE_QUERIES
            .iter()
            .map(|q| {
                q.trim()
                    .strip_prefix("INSERT INTO ")
                    .and_then(|rest| rest.split_whitespace().next())
                    .unwrap()
            })
            .collect();
        assert_eq!(targets, ["songplay", "users", "song", "artist", "time"]);
        assert!(TIME_INSERT.contains("FROM songplay"));
    }

    #[test]
    fn dimension_inserts_skip_null_keys() {
        assert!(USERS_INSERT.contains("WHERE userid IS NOT NULL"));
        assert!(SONG_INSERT.contains("WHERE song_id IS NOT NULL"));
        assert!(ARTIST_INSERT.contains("WHERE artist_id IS NOT NULL"));
        for q in [USERS_INSERT, SONG_INSERT, ARTIST_INSERT] {
            assert!(q.contains("SELECT DISTINCT"));
        }
    }

    #[test]
    fn events_copy_uses_jsonpath_and_source_region() {
        let sql = staging_events_copy(&source());
        assert!(sql.starts_with("COPY staging_events\n"));
        assert!(sql.contains("FROM 's3://udacity-dend/log_data'"));
        assert!(sql.contains(&format!("CREDENTIALS 'aws_iam_role={ROLE_ARN}'")));
        assert!(sql.contains("FORMAT AS JSON 's3://udacity-dend/log_json_path.json'"));
        assert!(sql.contains("COMPUPDATE OFF"));
        assert!(sql.ends_with("REGION 'us-west-2';"));
    }

    #[test]
    fn songs_copy_uses_auto_mapping() {
        let sql = staging_songs_copy(&source());
        assert!(sql.starts_with("COPY staging_songs\n"));
        assert!(sql.contains("FROM 's3://udacity-dend/song_data'"));
        assert!(sql.contains("FORMAT AS JSON 'auto'"));
    }

    #[test]
    fn copy_region_follows_bucket_not_cluster() {
        let mut settings = test_settings();
        settings.aws.region = "eu-central-1".to_string();
        settings.s3.region = "us-east-1".to_string();

        let [events, songs] = copy_table_queries(&CopySource::from_settings(&settings, ROLE_ARN));
        assert!(events.contains("REGION 'us-east-1'"));
        assert!(songs.contains("REGION 'us-east-1'"));
    }

    #[test]
    fn literals_escape_quotes() {
        assert_eq!(literal("s3://bucket/o'neil"), "'s3://bucket/o''neil'");
    }
}
