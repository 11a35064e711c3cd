//! Integration tests for mdeploy

mod test_decode;
mod test_run;
