//! Describe the available tools.

use montage_cli::describe_tools;

pub fn run() -> anyhow::Result<()> {
    println!("Tools:");
    for tool in describe_tools() {
        println!("  {}", tool.name);
        println!("    {}", tool.summary);
        println!("    args: {}", tool.args);
    }
    Ok(())
}
