use memsec;

/// A secret that wipes its heap allocation when dropped. Zeroing is
/// hygiene, not a guarantee; copies made before construction are the
/// caller's problem.
#[derive(Debug, PartialEq)]
pub struct Password {
    password: String,
}

impl Password {
    pub fn new(password: String) -> Self {
        Password { password }
    }
    pub fn str(&self) -> &str {
        &self.password
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        unsafe {
            let bytes = self.password.as_mut_vec();
            memsec::memzero(bytes.as_mut_ptr(), bytes.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_str() {
        let password = Password::new(String::from("s3cret"));
        assert_eq!(password.str(), "s3cret");
    }

    #[test]
    fn test_empty_password() {
        let password = Password::new(String::new());
        assert!(password.str().is_empty());
    }
}
