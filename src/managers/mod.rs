pub mod directory;
pub mod ledger;
pub mod token_store;

pub use directory::{Directory, DirectoryError, InMemoryDirectory};
pub use ledger::{AttendanceLedger, InMemoryLedger, LedgerError};
pub use token_store::{InMemoryTokenStore, TokenStore, TokenStoreError};
