//! DDL for the four corpus tables.

/// Tables in dependency order (referenced tables first).
pub const TABLES: &[&str] = &["act_type", "act", "act_type_link", "act_version"];

pub const CREATE: &str = "
CREATE SEQUENCE IF NOT EXISTS act_type_id_seq START 1;
CREATE TABLE IF NOT EXISTS act_type (
    id   BIGINT PRIMARY KEY DEFAULT nextval('act_type_id_seq'),
    code VARCHAR NOT NULL UNIQUE
);

CREATE SEQUENCE IF NOT EXISTS act_id_seq START 1;
CREATE TABLE IF NOT EXISTS act (
    id               BIGINT PRIMARY KEY DEFAULT nextval('act_id_seq'),
    code             VARCHAR NOT NULL UNIQUE,
    sa_doc_number_ru VARCHAR NOT NULL,
    sa_doc_number_kz VARCHAR NOT NULL,
    ju_doc_number    VARCHAR NOT NULL,
    ngr              VARCHAR NOT NULL,
    status           VARCHAR,
    registry_number  VARCHAR NOT NULL,
    sa_approval_date DATE NOT NULL,
    ju_approval_date DATE,
    action_date      DATE,
    effective_date   DATE,
    initial_pub_date DATE,
    title            VARCHAR NOT NULL,
    requisite        VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS act_type_link (
    act_id  BIGINT NOT NULL REFERENCES act(id),
    type_id BIGINT NOT NULL REFERENCES act_type(id),
    PRIMARY KEY (act_id, type_id)
);

-- cause_act_id is a weak edge to act(id): filled by the cause linker, never owning.
CREATE SEQUENCE IF NOT EXISTS act_version_id_seq START 1;
CREATE TABLE IF NOT EXISTS act_version (
    id             BIGINT PRIMARY KEY DEFAULT nextval('act_version_id_seq'),
    act_id         BIGINT NOT NULL REFERENCES act(id),
    date           DATE NOT NULL,
    language       VARCHAR NOT NULL,
    is_actual      BOOLEAN NOT NULL,
    version_id     VARCHAR NOT NULL,
    content        VARCHAR NOT NULL,
    cause_act_code VARCHAR,
    cause_act_id   BIGINT,
    UNIQUE (act_id, date, language)
);
";

pub const DROP: &str = "
DROP TABLE IF EXISTS act_version;
DROP TABLE IF EXISTS act_type_link;
DROP TABLE IF EXISTS act;
DROP TABLE IF EXISTS act_type;
DROP SEQUENCE IF EXISTS act_version_id_seq;
DROP SEQUENCE IF EXISTS act_id_seq;
DROP SEQUENCE IF EXISTS act_type_id_seq;
";
