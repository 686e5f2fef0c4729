mod credentials_store;

pub use credentials_store::{
    credentials_path, delete_credentials, get_credentials, store_credentials,
};
