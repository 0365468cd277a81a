//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per student, created on first successful login (or the first
-- submission that needs it). The device binding columns are written only by
-- the bind/unbind operations, never by profile edits.
CREATE TABLE IF NOT EXISTS profiles (
    profile_id      TEXT PRIMARY KEY,
    roll_number     TEXT NOT NULL UNIQUE,
    student_name    TEXT,
    department      TEXT,
    email           TEXT,
    phone           TEXT,
    photo_ref       TEXT,
    device_token    TEXT,            -- set at most once; NULL until first bind
    device_bound_at TEXT,
    last_seen_from  TEXT,
    suspended       INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id  TEXT PRIMARY KEY,
    roll_number    TEXT NOT NULL
                     REFERENCES profiles(roll_number) ON DELETE CASCADE,
    student_name   TEXT NOT NULL,
    title          TEXT NOT NULL,
    description    TEXT NOT NULL,
    technologies   TEXT NOT NULL DEFAULT '[]',  -- JSON array
    team_members   TEXT NOT NULL DEFAULT '[]',  -- JSON array
    team_size      INTEGER NOT NULL,
    estimated_cost REAL,
    requirements   TEXT,
    status         TEXT NOT NULL DEFAULT 'pending',
    remarks        TEXT,
    submitted_at   TEXT NOT NULL
);

-- Notices are not FK-bound to profiles: the admin may address a roll number
-- that has not enrolled yet.
CREATE TABLE IF NOT EXISTS notices (
    notice_id   TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    message     TEXT NOT NULL,
    scope       TEXT NOT NULL,       -- 'broadcast' | 'student'
    roll_number TEXT,                -- addressee, for 'student' scope
    read        INTEGER NOT NULL DEFAULT 0,
    posted_by   TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    CHECK (scope != 'student' OR roll_number IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS managed_students (
    roll_number  TEXT PRIMARY KEY,
    student_name TEXT,
    department   TEXT,
    added_by     TEXT NOT NULL,
    added_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_roll_idx   ON submissions(roll_number);
CREATE INDEX IF NOT EXISTS submissions_status_idx ON submissions(status);
CREATE INDEX IF NOT EXISTS notices_roll_idx       ON notices(roll_number);

PRAGMA user_version = 1;
";
