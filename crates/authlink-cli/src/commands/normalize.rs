use anyhow::Result;
use authlink_core::normalize;

pub fn execute(text: &[String]) -> Result<()> {
    println!("{}", normalize(&text.join(" ")));
    Ok(())
}
