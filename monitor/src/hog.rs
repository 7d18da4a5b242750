//! Memory allocation helper for exercising the monitor by hand

use std::time::Duration;

use anyhow::{anyhow, Result};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Stride between touched bytes; smaller than any page size
const TOUCH_STRIDE: usize = 1024;

/// Allocate `megabytes` MiB and write to every page so it becomes resident
pub fn allocate(megabytes: usize) -> Result<Vec<u8>> {
    let bytes = megabytes
        .checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow!("{}MB does not fit in the address space", megabytes))?;
    let mut buf = vec![0u8; bytes];
    for i in (0..bytes).step_by(TOUCH_STRIDE) {
        buf[i] = (i % 256) as u8;
    }
    std::hint::black_box(&buf);
    Ok(buf)
}

/// Hold the allocation until Ctrl+C
pub async fn run(megabytes: usize) -> Result<()> {
    println!("Allocating {}MB of memory...", megabytes);
    let buf = allocate(megabytes)?;
    println!("Successfully allocated {}MB", megabytes);
    println!("Process PID: {}", std::process::id());
    println!("Press Ctrl+C to exit...");

    let mut ticker = tokio::time::interval(Duration::from_secs(10));
    ticker.tick().await;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                println!("\nExiting...");
                break;
            }
            _ = ticker.tick() => {
                println!(
                    "Still holding {}MB of memory... (PID: {})",
                    buf.len() / BYTES_PER_MB,
                    std::process::id()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_touches_pages() {
        let buf = allocate(2).unwrap();
        assert_eq!(buf.len(), 2 * BYTES_PER_MB);
        assert_eq!(buf[TOUCH_STRIDE], (TOUCH_STRIDE % 256) as u8);
        assert_eq!(buf[3 * TOUCH_STRIDE + 1], 0);
    }

    #[test]
    fn test_allocate_rejects_overflowing_size() {
        let err = allocate(usize::MAX).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[tokio::test]
    async fn test_run_reports_overflowing_size() {
        assert!(run(usize::MAX / 2).await.is_err());
    }
}
