//! Diesel schema for the gateway registry.

diesel::table! {
    /// Registered backend servers.
    mcp_servers (id) {
        /// Internal server identifier.
        id -> Uuid,
        /// Unique human-readable server name.
        #[max_length = 100]
        name -> Varchar,
        /// Backend endpoint URL.
        endpoint -> Text,
        /// Optional bearer credential.
        bearer_token -> Nullable<Text>,
        /// Free-text description.
        description -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tools discovered on registered servers.
    mcp_tools (id) {
        /// Internal tool identifier.
        id -> Uuid,
        /// Owning server.
        server_id -> Uuid,
        /// Original tool name, unique per server.
        #[max_length = 255]
        name -> Varchar,
        /// Tool description.
        description -> Text,
        /// Input schema as JSONB.
        input_schema -> Jsonb,
        /// Optional output schema as JSONB.
        output_schema -> Nullable<Jsonb>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(mcp_tools -> mcp_servers (server_id));
diesel::allow_tables_to_appear_in_same_query!(mcp_servers, mcp_tools);
