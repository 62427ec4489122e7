//! Centralized string constants shared by the client, the resource generator and the CLI.

// HTTP Headers
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

// Content Types
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_HTML: &str = "text/html";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_IDENTIFIER_JSON: &str = "json";

// Response type shorthands accepted in place of a MIME type
pub const RESPONSE_TYPE_JSON: &str = "json";
pub const RESPONSE_TYPE_TEXT: &str = "text";
pub const RESPONSE_TYPE_XML: &str = "xml";
pub const RESPONSE_TYPE_HTML: &str = "html";
pub const RESPONSE_TYPE_FORM: &str = "form";
pub const RESPONSE_TYPE_URLENCODED: &str = "urlencoded";

// Reserved action names generated for every resource
pub const ACTION_GET: &str = "get";
pub const ACTION_QUERY: &str = "query";
pub const ACTION_POST: &str = "post";
pub const ACTION_PUT: &str = "put";
pub const ACTION_SAVE: &str = "save";
pub const ACTION_REMOVE: &str = "remove";
pub const ACTION_DELETE: &str = "delete";

// URL templates
pub const PARAM_PAYLOAD_PREFIX: char = '@';
pub const RESERVED_PARAM_NAME: &str = "hasOwnProperty";
pub const CACHE_KEY_SEPARATOR: char = '_';
pub const EMPTY_JSON_OBJECT: &str = "{}";

// Default cache store
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 1200;

// Environment Variables
pub const ENV_RESOURCEFUL_CONFIG: &str = "RESOURCEFUL_CONFIG";
pub const ENV_RESOURCEFUL_LOG: &str = "RESOURCEFUL_LOG";
pub const ENV_RESOURCEFUL_LOG_FORMAT: &str = "RESOURCEFUL_LOG_FORMAT";
pub const ENV_RESOURCEFUL_LOG_FILE: &str = "RESOURCEFUL_LOG_FILE";
pub const ENV_RESOURCEFUL_LOG_MAX_BODY: &str = "RESOURCEFUL_LOG_MAX_BODY";

// Configuration files
pub const CONFIG_DIR_NAME: &str = "resourceful";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Logging targets
pub const LOG_TARGET_PIPELINE: &str = "resourceful::pipeline";
pub const LOG_TARGET_PARAMS: &str = "resourceful::params";
