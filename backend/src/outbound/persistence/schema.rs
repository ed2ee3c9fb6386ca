//! Diesel table definitions. Keep in step with `backend/migrations`.

diesel::table! {
    /// Every guide entity row. `table_name` selects the logical table and
    /// `payload` holds the entity body as a JSON object.
    guide_rows (table_name, id) {
        table_name -> Varchar,
        id -> Uuid,
        payload -> Jsonb,
        create_user_id -> Nullable<Uuid>,
        update_user_id -> Nullable<Uuid>,
        auth_user_id -> Nullable<Uuid>,
        auth_customer_id -> Nullable<Uuid>,
        row_created_date -> Timestamptz,
        row_updated_date -> Timestamptz,
        row_is_active -> Bool,
        row_is_deleted -> Bool,
    }
}

diesel::table! {
    /// Display names for attribution ids, maintained by the identity service.
    auth_users (id) {
        id -> Uuid,
        user_name -> Varchar,
        customer_name -> Nullable<Varchar>,
    }
}
