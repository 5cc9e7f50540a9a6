//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. When a
//! migration changes a table, regenerate with `diesel print-schema` or edit
//! by hand.

diesel::table! {
    /// Library members keyed by identity-service subject.
    user_profiles (subject) {
        subject -> Varchar,
        email -> Nullable<Varchar>,
        display_name -> Varchar,
        role -> Varchar,
        department -> Nullable<Varchar>,
        semester -> Nullable<Varchar>,
        member_id -> Nullable<Varchar>,
        mobile -> Nullable<Varchar>,
        /// Blob name of the stored proof document.
        proof_file -> Nullable<Varchar>,
        /// One of `unverified`, `verified` or `rejected`.
        proof_status -> Varchar,
        proof_reviewed_at -> Nullable<Timestamptz>,
        proof_rejection_reason -> Nullable<Text>,
        proof_uploaded_at -> Nullable<Timestamptz>,
        suspended_at -> Nullable<Timestamptz>,
        profile_completed -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Administrators keyed by identity-service subject.
    admin_profiles (subject) {
        subject -> Varchar,
        email -> Varchar,
        display_name -> Varchar,
        elevation_key_used -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Last member number handed out per department.
    department_counters (department) {
        department -> Varchar,
        last_value -> Int4,
    }
}

diesel::table! {
    content_items (id) {
        id -> Uuid,
        title -> Varchar,
        author -> Varchar,
        description -> Nullable<Text>,
        department -> Nullable<Varchar>,
        semester -> Nullable<Varchar>,
        premium -> Bool,
        /// Price in minor currency units.
        price_minor -> Int8,
        featured -> Bool,
        cover_blob -> Nullable<Varchar>,
        document_blob -> Nullable<Varchar>,
        uploaded_by -> Nullable<Varchar>,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    purchases (subject, item_id) {
        subject -> Varchar,
        item_id -> Uuid,
        amount_minor -> Int8,
        purchased_at -> Timestamptz,
        transaction_ref -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Binary content addressed by logical name.
    blobs (name) {
        name -> Varchar,
        content -> Bytea,
        size -> Int8,
        content_type -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    user_profiles,
    admin_profiles,
    department_counters,
    content_items,
    purchases,
    blobs,
);
