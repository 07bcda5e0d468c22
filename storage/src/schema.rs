//! Canonical schema, one DDL script per backend.
//!
//! Both scripts are idempotent and run on every startup.

pub const POSTGRES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS ingredients (
    ingredient_id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS challenge_requests (
    request_id BIGSERIAL PRIMARY KEY,
    requested_by BIGINT NOT NULL REFERENCES users(user_id),
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'NOT_REVIEWED'
        CHECK (status IN ('NOT_REVIEWED', 'APPROVED', 'DENIED')),
    reviewed_by BIGINT REFERENCES users(user_id),
    date_submitted TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_requests_status ON challenge_requests(status);
CREATE INDEX IF NOT EXISTS idx_requests_requested_by ON challenge_requests(requested_by);

CREATE TABLE IF NOT EXISTS request_ingredients (
    request_id BIGINT NOT NULL REFERENCES challenge_requests(request_id),
    ingredient_id BIGINT NOT NULL REFERENCES ingredients(ingredient_id),
    PRIMARY KEY (request_id, ingredient_id)
);

-- request_id is UNIQUE: one request yields at most one challenge
CREATE TABLE IF NOT EXISTS challenges (
    challenge_id BIGSERIAL PRIMARY KEY,
    request_id BIGINT NOT NULL UNIQUE REFERENCES challenge_requests(request_id),
    description TEXT NOT NULL,
    approved_by BIGINT NOT NULL REFERENCES users(user_id),
    difficulty TEXT CHECK (difficulty IN ('EASY', 'MEDIUM', 'HARD')),
    status TEXT NOT NULL DEFAULT 'UNCLAIMED'
        CHECK (status IN ('UNCLAIMED', 'IN_PROGRESS', 'COMPLETED')),
    claimed_by BIGINT REFERENCES users(user_id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_challenges_status ON challenges(status);
CREATE INDEX IF NOT EXISTS idx_challenges_claimed_by ON challenges(claimed_by);

CREATE TABLE IF NOT EXISTS challenge_ingredients (
    challenge_id BIGINT NOT NULL REFERENCES challenges(challenge_id),
    ingredient_id BIGINT NOT NULL REFERENCES ingredients(ingredient_id),
    PRIMARY KEY (challenge_id, ingredient_id)
);
"#;

pub const SQLITE_SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ingredients (
    ingredient_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS challenge_requests (
    request_id INTEGER PRIMARY KEY AUTOINCREMENT,
    requested_by INTEGER NOT NULL REFERENCES users(user_id),
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'NOT_REVIEWED'
        CHECK (status IN ('NOT_REVIEWED', 'APPROVED', 'DENIED')),
    reviewed_by INTEGER REFERENCES users(user_id),
    date_submitted TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_requests_status ON challenge_requests(status);
CREATE INDEX IF NOT EXISTS idx_requests_requested_by ON challenge_requests(requested_by);

CREATE TABLE IF NOT EXISTS request_ingredients (
    request_id INTEGER NOT NULL REFERENCES challenge_requests(request_id),
    ingredient_id INTEGER NOT NULL REFERENCES ingredients(ingredient_id),
    PRIMARY KEY (request_id, ingredient_id)
);

CREATE TABLE IF NOT EXISTS challenges (
    challenge_id INTEGER PRIMARY KEY AUTOINCREMENT,
    request_id INTEGER NOT NULL UNIQUE REFERENCES challenge_requests(request_id),
    description TEXT NOT NULL,
    approved_by INTEGER NOT NULL REFERENCES users(user_id),
    difficulty TEXT CHECK (difficulty IN ('EASY', 'MEDIUM', 'HARD')),
    status TEXT NOT NULL DEFAULT 'UNCLAIMED'
        CHECK (status IN ('UNCLAIMED', 'IN_PROGRESS', 'COMPLETED')),
    claimed_by INTEGER REFERENCES users(user_id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_challenges_status ON challenges(status);
CREATE INDEX IF NOT EXISTS idx_challenges_claimed_by ON challenges(claimed_by);

CREATE TABLE IF NOT EXISTS challenge_ingredients (
    challenge_id INTEGER NOT NULL REFERENCES challenges(challenge_id),
    ingredient_id INTEGER NOT NULL REFERENCES ingredients(ingredient_id),
    PRIMARY KEY (challenge_id, ingredient_id)
);
"#;
