// Drives

pub const SELECT_OPEN_DRIVE: &str = r#"
SELECT id, user_id, lodge_id, started_at, ended_at, route, photos, notes
FROM drive_sessions
WHERE user_id = $1 AND ended_at IS NULL;
"#;

pub const INSERT_OPEN_DRIVE: &str = r#"
INSERT INTO drive_sessions (user_id, lodge_id, started_at)
VALUES ($1, $2, NOW())
ON CONFLICT (user_id) WHERE ended_at IS NULL DO NOTHING;
"#;

pub const INSERT_COMPLETED_DRIVE: &str = r#"
INSERT INTO drive_sessions (user_id, lodge_id, started_at, ended_at, route, photos, notes)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING id;
"#;

pub const SELECT_DRIVE_FOR_UPDATE: &str = r#"
SELECT id, user_id, lodge_id, started_at, ended_at, route, photos, notes
FROM drive_sessions
WHERE id = $1
FOR UPDATE;
"#;

pub const SELECT_DRIVE: &str = r#"
SELECT id, user_id, lodge_id, started_at, ended_at, route, photos, notes
FROM drive_sessions
WHERE id = $1 AND user_id = $2;
"#;

pub const UPDATE_DRIVE_ROUTE: &str = r#"
UPDATE drive_sessions
SET route = $2
WHERE id = $1;
"#;

pub const UPDATE_DRIVE_END: &str = r#"
UPDATE drive_sessions
SET route = $2,
    ended_at = NOW()
WHERE id = $1;
"#;

pub const SELECT_DRIVE_SUMMARIES: &str = r#"
SELECT d.id,
       d.started_at,
       d.ended_at,
       d.notes,
       jsonb_array_length(d.route) AS point_count,
       COUNT(s.id) AS sighting_count
FROM drive_sessions d
LEFT JOIN sightings s ON s.drive_session_id = d.id
WHERE d.user_id = $1
GROUP BY d.id
ORDER BY d.started_at DESC
LIMIT $2;
"#;

pub const SELECT_DRIVE_OWNER: &str = r#"
SELECT user_id FROM drive_sessions WHERE id = $1;
"#;

// Sightings

pub const INSERT_SIGHTING: &str = r#"
INSERT INTO sightings (user_id, drive_session_id, species_id, latitude, longitude, count, notes)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING id, user_id, drive_session_id, species_id, latitude, longitude, count, notes, created_at;
"#;

pub const SELECT_DRIVE_SIGHTINGS: &str = r#"
SELECT s.id, s.drive_session_id, s.species_id, sp.common_name AS species_common_name,
       u.name AS user_name, s.latitude, s.longitude, s.count, s.notes, s.created_at
FROM sightings s
JOIN species sp ON sp.id = s.species_id
LEFT JOIN users u ON u.id = s.user_id
WHERE s.drive_session_id = $1
ORDER BY s.created_at ASC;
"#;

pub const SELECT_RECENT_SIGHTINGS: &str = r#"
SELECT s.id, s.drive_session_id, s.species_id, sp.common_name AS species_common_name,
       u.name AS user_name, s.latitude, s.longitude, s.count, s.notes, s.created_at
FROM sightings s
JOIN species sp ON sp.id = s.species_id
LEFT JOIN users u ON u.id = s.user_id
ORDER BY s.created_at DESC
LIMIT $1;
"#;

// Species

pub const SELECT_ALL_SPECIES: &str = r#"
SELECT id, common_name, scientific_name, category, family
FROM species
ORDER BY common_name ASC;
"#;

pub const SELECT_SPECIES_BY_CATEGORY: &str = r#"
SELECT id, common_name, scientific_name, category, family
FROM species
WHERE category = $1
ORDER BY common_name ASC;
"#;

pub const SELECT_SPECIES_CATEGORIES: &str = r#"
SELECT DISTINCT category FROM species ORDER BY category ASC;
"#;

pub const SEARCH_SPECIES: &str = r#"
SELECT id, common_name, scientific_name, category, family
FROM species
WHERE common_name ILIKE '%' || $1 || '%'
ORDER BY common_name ASC
LIMIT 20;
"#;

pub const INSERT_SPECIES: &str = r#"
INSERT INTO species (common_name, scientific_name, category, family)
VALUES ($1, $2, $3, $4)
RETURNING id, common_name, scientific_name, category, family;
"#;

pub const SPECIES_EXISTS: &str = r#"
SELECT EXISTS (SELECT 1 FROM species WHERE id = $1);
"#;

// Checklist

pub const SELECT_CHECKLIST: &str = r#"
SELECT sp.id AS species_id,
       sp.common_name,
       sp.scientific_name,
       sp.category,
       sp.family,
       COALESCE(ci.spotted, FALSE) AS spotted,
       COALESCE(ci.sighting_count, 0) AS sighting_count,
       ci.first_spotted_at
FROM species sp
LEFT JOIN checklist_items ci ON ci.species_id = sp.id AND ci.user_id = $1
WHERE ($2::TEXT IS NULL OR sp.category = $2)
ORDER BY sp.common_name ASC;
"#;

pub const SELECT_CHECKLIST_ITEM_FOR_UPDATE: &str = r#"
SELECT id, user_id, species_id, spotted, sighting_count, first_spotted_at, last_latitude, last_longitude
FROM checklist_items
WHERE user_id = $1 AND species_id = $2
FOR UPDATE;
"#;

pub const INSERT_CHECKLIST_ITEM: &str = r#"
INSERT INTO checklist_items (user_id, species_id, spotted, sighting_count, first_spotted_at, last_latitude, last_longitude)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING id, user_id, species_id, spotted, sighting_count, first_spotted_at, last_latitude, last_longitude;
"#;

pub const UPDATE_CHECKLIST_ITEM: &str = r#"
UPDATE checklist_items
SET spotted = $2,
    sighting_count = $3,
    first_spotted_at = $4,
    last_latitude = $5,
    last_longitude = $6
WHERE id = $1
RETURNING id, user_id, species_id, spotted, sighting_count, first_spotted_at, last_latitude, last_longitude;
"#;

pub const UPSERT_CHECKLIST_FROM_SIGHTING: &str = r#"
INSERT INTO checklist_items (user_id, species_id, spotted, sighting_count, first_spotted_at, last_latitude, last_longitude)
VALUES ($1, $2, TRUE, 1, NOW(), $3, $4)
ON CONFLICT (user_id, species_id) DO UPDATE
SET spotted = TRUE,
    sighting_count = checklist_items.sighting_count + 1,
    first_spotted_at = COALESCE(checklist_items.first_spotted_at, NOW()),
    last_latitude = $3,
    last_longitude = $4
RETURNING id, user_id, species_id, spotted, sighting_count, first_spotted_at, last_latitude, last_longitude;
"#;

pub const COUNT_SPECIES_BY_CATEGORY: &str = r#"
SELECT category, COUNT(*) AS total FROM species GROUP BY category;
"#;

pub const COUNT_SPOTTED_BY_CATEGORY: &str = r#"
SELECT sp.category, COUNT(*) AS spotted
FROM checklist_items ci
JOIN species sp ON sp.id = ci.species_id
WHERE ci.user_id = $1 AND ci.spotted
GROUP BY sp.category;
"#;

// Lodges

pub const SELECT_LODGES: &str = r#"
SELECT id, name FROM lodges ORDER BY name ASC;
"#;

pub const SELECT_LODGE: &str = r#"
SELECT id, name FROM lodges WHERE id = $1;
"#;

// Users

pub const SELECT_USER_PROFILE: &str = r#"
SELECT u.id, u.name, u.email, u.role, u.distance_unit,
       l.id AS lodge_id, l.name AS lodge_name
FROM users u
LEFT JOIN lodges l ON l.id = u.lodge_id
WHERE u.id = $1;
"#;

pub const USER_NAME_TAKEN: &str = r#"
SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(name) = LOWER($1) AND id <> $2);
"#;

pub const USER_EMAIL_TAKEN: &str = r#"
SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id <> $2);
"#;

pub const UPDATE_USER_PROFILE: &str = r#"
UPDATE users
SET name = COALESCE($2, name),
    email = COALESCE($3, email),
    distance_unit = COALESCE($4, distance_unit)
WHERE id = $1;
"#;

// Settings

pub const SELECT_SETTINGS: &str = r#"
SELECT key, value FROM app_settings WHERE key = ANY($1);
"#;

pub const UPSERT_SETTING: &str = r#"
INSERT INTO app_settings (key, value)
VALUES ($1, $2)
ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value;
"#;

// Strava

pub const SELECT_STRAVA_ACCOUNT: &str = r#"
SELECT athlete_id, first_name, last_name, profile_image_url,
       access_token, refresh_token, expires_at
FROM strava_accounts
WHERE user_id = $1;
"#;

pub const UPSERT_STRAVA_ACCOUNT: &str = r#"
INSERT INTO strava_accounts (
    user_id, athlete_id, first_name, last_name, profile_image_url,
    access_token, refresh_token, expires_at, scope
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT (user_id) DO UPDATE
SET athlete_id = EXCLUDED.athlete_id,
    first_name = EXCLUDED.first_name,
    last_name = EXCLUDED.last_name,
    profile_image_url = EXCLUDED.profile_image_url,
    access_token = EXCLUDED.access_token,
    refresh_token = EXCLUDED.refresh_token,
    expires_at = EXCLUDED.expires_at,
    scope = EXCLUDED.scope;
"#;

pub const UPDATE_STRAVA_TOKENS: &str = r#"
UPDATE strava_accounts
SET access_token = $2,
    refresh_token = $3,
    expires_at = $4
WHERE user_id = $1;
"#;

pub const DELETE_STRAVA_ACCOUNT: &str = r#"
DELETE FROM strava_accounts WHERE user_id = $1;
"#;
