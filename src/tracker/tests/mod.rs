use super::test_helpers::*;
use super::*;
use crate::error::{AuthError, Error, JobError};
use crate::types::{JobId, Status, StatusUpdate};
use std::time::Duration;
