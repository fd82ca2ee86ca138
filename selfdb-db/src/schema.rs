// Hand-maintained to match the migrations this service expects to already
// be applied (migrations themselves are out of scope per spec.md §1).
diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        password_hash -> Text,
        active -> Bool,
        superuser -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    refresh_tokens (id) {
        id -> Uuid,
        user_id -> Uuid,
        token_hash -> Bytea,
        expires_at -> Timestamptz,
        revoked_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    buckets (id) {
        id -> Uuid,
        display_name -> Text,
        storage_name -> Text,
        description -> Nullable<Text>,
        is_public -> Bool,
        owner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    files (id) {
        id -> Uuid,
        filename -> Text,
        object_key -> Text,
        bucket_id -> Uuid,
        content_type -> Nullable<Text>,
        size -> Int8,
        owner_id -> Uuid,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    origin_policy_entries (id) {
        id -> Uuid,
        origin -> Text,
        is_active -> Bool,
        creator_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(refresh_tokens -> users (user_id));
diesel::joinable!(buckets -> users (owner_id));
diesel::joinable!(files -> buckets (bucket_id));
diesel::joinable!(origin_policy_entries -> users (creator_id));

diesel::allow_tables_to_appear_in_same_query!(users, refresh_tokens, buckets, files, origin_policy_entries,);
