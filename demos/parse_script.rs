//! Parse a script, print it in canonical form, then show how errors
//! are reported.

fn main() {
    let input = "\
var total = 0
for (var i = 1; i <= 10; i++) {
\tif i % 2 == 0 then total += i * i
}
message = \"sum of even squares: #{total}\"
";

    match fscript::parse_str(input) {
        Ok(program) => {
            println!("Parsed {} statement(s):", program.statements.len());
            print!("{}", fscript::format(&program));
        }
        Err(e) => println!("Error: {e}"),
    }

    println!();

    // Unclosed parenthesis
    match fscript::parse_str("x = (1 + 2 * 3\n") {
        Ok(_) => println!("Parsed OK (unexpected)"),
        Err(e) => {
            println!("Error: {e}");
            println!("  Kind: {:?}", e.kind);
            println!("  Category: {}", e.category());
            println!("  Location: line {}, column {}", e.span.line, e.span.column);
        }
    }
}
