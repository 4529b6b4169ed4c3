use tempfile::TempDir;

use super::*;

fn record(email: &str) -> SessionRecord {
	SessionRecord {
		email: email.to_string(),
		password: "p".to_string(),
		arl: None,
		last_updated: None,
		enabled: true,
		kind: None,
	}
}

fn seed_store(dir: &TempDir, records: &[SessionRecord]) -> PathBuf {
	let path = dir.path().join("sessions.json");
	fs::write(&path, serde_json::to_string_pretty(records).unwrap()).unwrap();
	path
}

fn days_ago(days: f64) -> u64 {
	now_ts() - (days * SECS_PER_DAY as f64) as u64
}

#[test]
fn save_then_open_round_trips_all_fields() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("sessions.json");

	let mut store = SessionStore::open(&path).unwrap();
	store
		.upsert(RecordUpdate::new("a@x.com").password("pw-a").kind(Some("premium")))
		.unwrap();
	store
		.upsert(RecordUpdate::new("b@x.com").password("pw-b").arl("ARLB").enabled(false))
		.unwrap();

	let reopened = SessionStore::open(&path).unwrap();
	assert_eq!(reopened.records(), store.records());

	let b = reopened.find("b@x.com").unwrap();
	assert_eq!(b.password, "pw-b");
	assert_eq!(b.arl.as_deref(), Some("ARLB"));
	assert!(!b.enabled);
	assert!(b.last_updated.is_some());
}

#[test]
fn open_recovers_from_a_corrupt_file() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("sessions.json");
	fs::write(&path, "{ not json").unwrap();

	let store = SessionStore::open(&path).unwrap();
	assert!(store.records().is_empty());

	// The file is recreated as an empty document.
	let content = fs::read_to_string(&path).unwrap();
	let parsed: Vec<SessionRecord> = serde_json::from_str(&content).unwrap();
	assert!(parsed.is_empty());
}

#[test]
fn open_creates_a_missing_file() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("data").join("sessions.json");

	let store = SessionStore::open(&path).unwrap();
	assert!(store.records().is_empty());
	assert!(path.exists());
}

#[test]
fn wire_names_match_the_document_format() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("sessions.json");

	let mut store = SessionStore::open(&path).unwrap();
	store
		.upsert(RecordUpdate::new("a@x.com").password("p").arl("ARL1").kind(Some("free")))
		.unwrap();

	let content = fs::read_to_string(&path).unwrap();
	assert!(content.contains("\"lastUpdated\""));
	assert!(content.contains("\"enable\""));
	assert!(content.contains("\"type\""));
	assert!(!content.contains("\"kind\""));
}

#[test]
fn upsert_without_fields_keeps_password_and_token() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("sessions.json");

	let mut store = SessionStore::open(&path).unwrap();
	store
		.upsert(RecordUpdate::new("a@x.com").password("secret").arl("ARL1"))
		.unwrap();

	store.upsert(RecordUpdate::new("a@x.com")).unwrap();

	let record = store.find("a@x.com").unwrap();
	assert_eq!(record.password, "secret");
	assert_eq!(record.arl.as_deref(), Some("ARL1"));
	assert!(record.enabled);
}

#[test]
fn creating_requires_a_password() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("sessions.json");

	let mut store = SessionStore::open(&path).unwrap();
	let err = store.upsert(RecordUpdate::new("new@x.com")).unwrap_err();
	assert!(matches!(err, ArlError::MissingCredential { email } if email == "new@x.com"));
	assert!(store.records().is_empty());

	store.upsert(RecordUpdate::new("new@x.com").password("p")).unwrap();
	assert_eq!(store.records().len(), 1);
}

#[test]
fn upsert_bumps_last_updated() {
	let temp = TempDir::new().unwrap();
	let mut stale = record("a@x.com");
	stale.arl = Some("ARL1".to_string());
	stale.last_updated = Some(days_ago(10.0));
	let path = seed_store(&temp, &[stale]);

	let before = now_ts();
	let mut store = SessionStore::open(&path).unwrap();
	store.upsert(RecordUpdate::new("a@x.com")).unwrap();

	assert!(store.find("a@x.com").unwrap().last_updated.unwrap() >= before);
}

#[test]
fn needs_refresh_matches_the_staleness_predicate() {
	let temp = TempDir::new().unwrap();

	let mut expired = record("expired@x.com");
	expired.arl = Some("ARL-OLD".to_string());
	expired.last_updated = Some(days_ago(16.0));

	let mut fresh = record("fresh@x.com");
	fresh.arl = Some("ARL-FRESH".to_string());
	fresh.last_updated = Some(days_ago(14.0));

	let mut empty_token = record("empty@x.com");
	empty_token.arl = Some(String::new());
	empty_token.last_updated = Some(days_ago(1.0));

	let never = record("never@x.com");

	let path = seed_store(&temp, &[expired, fresh, empty_token, never]);
	let store = SessionStore::open(&path).unwrap();

	let batch = store.needs_refresh(RefreshPolicy::IncludeDisabled);
	let emails: Vec<&str> = batch.iter().map(|record| record.email.as_str()).collect();
	assert_eq!(emails, ["expired@x.com", "empty@x.com", "never@x.com"]);
}

#[test]
fn refresh_policy_can_skip_disabled_records() {
	let temp = TempDir::new().unwrap();

	let enabled = record("on@x.com");
	let mut disabled = record("off@x.com");
	disabled.enabled = false;

	let path = seed_store(&temp, &[enabled, disabled]);
	let store = SessionStore::open(&path).unwrap();

	assert_eq!(store.needs_refresh(RefreshPolicy::IncludeDisabled).len(), 2);

	let filtered = store.needs_refresh(RefreshPolicy::SkipDisabled);
	assert_eq!(filtered.len(), 1);
	assert_eq!(filtered[0].email, "on@x.com");
}

#[test]
fn valid_within_days_bounds_are_inclusive() {
	let temp = TempDir::new().unwrap();

	let mut half_day = record("half@x.com");
	half_day.arl = Some("ARL1".to_string());
	half_day.last_updated = Some(days_ago(0.5));

	// A few seconds ahead of the clock, so the age reads exactly zero even
	// if the wall clock ticks during the test.
	let mut boundary = record("now@x.com");
	boundary.arl = Some("ARL2".to_string());
	boundary.last_updated = Some(now_ts() + 5);

	let path = seed_store(&temp, &[half_day, boundary]);
	let store = SessionStore::open(&path).unwrap();

	let within_one_day = store.valid_within_days(VALID_MAX_AGE_DAYS);
	assert_eq!(within_one_day.len(), 2);

	// Age exactly on the bound is still valid; 12 hours is past a 0-day bound.
	let within_zero_days = store.valid_within_days(0.0);
	assert_eq!(within_zero_days.len(), 1);
	assert_eq!(within_zero_days[0].email, "now@x.com");
}

#[test]
fn valid_queries_exclude_tokenless_and_timestampless_records() {
	let temp = TempDir::new().unwrap();

	let tokenless = record("none@x.com");

	let mut timestampless = record("stampless@x.com");
	timestampless.arl = Some("ARL1".to_string());

	let mut good = record("good@x.com");
	good.arl = Some("ARL2".to_string());
	good.last_updated = Some(days_ago(2.0));

	let path = seed_store(&temp, &[tokenless, timestampless, good]);
	let store = SessionStore::open(&path).unwrap();

	let exported = store.valid_for_export();
	assert_eq!(exported.len(), 1);
	assert_eq!(exported[0].email, "good@x.com");
}

#[test]
fn arl_preview_truncates_and_hides_empty_tokens() {
	let mut with_token = record("a@x.com");
	with_token.arl = Some("ARL1234567890".to_string());
	assert_eq!(with_token.arl_preview(10).as_deref(), Some("ARL1234567"));

	let mut empty = record("b@x.com");
	empty.arl = Some(String::new());
	assert_eq!(empty.arl_preview(10), None);
}
