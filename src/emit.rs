//! Emisión de código C.
//!
//! El emisor acumula dos regiones de texto. La cabecera contiene el
//! prólogo de C y una declaración por cada variable; el cuerpo contiene
//! las sentencias traducidas. La separación permite que variables
//! introducidas a mitad del programa queden declaradas antes de su
//! primer uso. La salida final es la concatenación de ambas regiones,
//! y se escribe una única vez luego de un parsing exitoso.

use std::{
    fmt::{self, Display},
    fs,
    io::{self, Write},
    path::PathBuf,
};

/// Destino del código emitido.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Archivo, el cual se crea o trunca.
    File(PathBuf),

    /// Salida estándar.
    Stdout,
}

impl Display for Destination {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::File(path) => path.display().fmt(fmt),
            Destination::Stdout => fmt.write_str("<stdout>"),
        }
    }
}

pub struct Emitter {
    destination: Destination,
    header: String,
    body: String,
}

impl Emitter {
    pub fn new(destination: Destination) -> Self {
        Emitter {
            destination,
            header: String::new(),
            body: String::new(),
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Agrega código al cuerpo, sin terminar la línea.
    pub fn emit(&mut self, code: &str) {
        self.body.push_str(code);
    }

    /// Agrega una línea completa al cuerpo.
    pub fn emit_line(&mut self, code: &str) {
        self.body.push_str(code);
        self.body.push('\n');
    }

    /// Agrega una línea completa a la cabecera.
    pub fn header_line(&mut self, code: &str) {
        self.header.push_str(code);
        self.header.push('\n');
    }

    /// Texto final: cabecera seguida del cuerpo.
    pub fn contents(&self) -> String {
        let mut contents = String::with_capacity(self.header.len() + self.body.len());
        contents.push_str(&self.header);
        contents.push_str(&self.body);
        contents
    }

    /// Escribe la salida completa a un flujo arbitrario.
    pub fn write_to<W: Write>(&self, output: &mut W) -> io::Result<()> {
        output.write_all(self.header.as_bytes())?;
        output.write_all(self.body.as_bytes())?;
        output.flush()
    }

    /// Escribe la salida a su destino, consumiendo el emisor.
    ///
    /// Retorna la cantidad de bytes escritos.
    pub fn finish(self) -> io::Result<usize> {
        let contents = self.contents();
        match &self.destination {
            Destination::File(path) => fs::write(path, &contents)?,
            Destination::Stdout => self.write_to(&mut io::stdout().lock())?,
        }

        Ok(contents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_precedes_body() {
        let mut emitter = Emitter::new(Destination::Stdout);
        emitter.emit("x = ");
        emitter.header_line("float x;");
        emitter.emit_line("1;");

        assert_eq!(emitter.contents(), "float x;\nx = 1;\n");
    }

    #[test]
    fn write_to_stream() {
        let mut emitter = Emitter::new(Destination::Stdout);
        emitter.header_line("#include <stdio.h>");
        emitter.emit_line("}");

        let mut output = Vec::new();
        emitter.write_to(&mut output).unwrap();
        assert_eq!(output, b"#include <stdio.h>\n}\n");
    }

    #[test]
    fn finish_truncates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.c");
        fs::write(&path, "stale contents that are longer than the output").unwrap();

        let mut emitter = Emitter::new(Destination::File(path.clone()));
        emitter.header_line("int main(void){");
        emitter.emit_line("}");

        assert_eq!(emitter.finish().unwrap(), 18);
        assert_eq!(fs::read_to_string(&path).unwrap(), "int main(void){\n}\n");
    }
}
