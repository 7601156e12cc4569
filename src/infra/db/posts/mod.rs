mod read;
mod write;

use super::PostgresRepositories;
