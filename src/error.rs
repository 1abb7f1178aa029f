//! Reporte de errores.
//!
//! Todo error del compilador está asociado a una ubicación en el código
//! fuente. [`Diagnostics`] presenta estos errores junto a la línea que
//! los origina y una marca bajo el rango exacto.

use crate::{
    parse::Failure,
    source::{Located, Location},
};

use std::{
    error::Error,
    fmt::{self, Display},
};

mod sealed {
    pub trait Sealed {}
}

pub trait LocatedError: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn location(&self) -> &Location;
}

pub struct Diagnostics {
    kind: &'static str,
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            errors: Default::default(),
        }
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
            ..Default::default()
        }
    }
}

impl From<Failure> for Diagnostics {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Lexical(error) => Diagnostics::from(error).kind("Lexical error"),
            Failure::Syntax(error) => Diagnostics::from(error).kind("Syntax error"),
            Failure::Semantic(error) => Diagnostics::from(error).kind("Semantic error"),
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in &self.errors {
            writeln!(fmt, "{}: {}", self.kind, error.source())?;
            snippet(fmt, error.location())?;
            writeln!(fmt)?;
        }

        let count = self.errors.len();
        let plural = if count == 1 { "" } else { "s" };
        writeln!(fmt, "Build failed with {} error{}", count, plural)
    }
}

/// Muestra las líneas que abarca una ubicación y subraya sus columnas.
fn snippet(fmt: &mut fmt::Formatter<'_>, location: &Location) -> fmt::Result {
    let (start, end) = (location.start(), location.end());
    let gutter = " ".repeat(end.line().to_string().len());

    writeln!(fmt, " --> {}", location)?;
    writeln!(fmt, "{} |", gutter)?;

    for number in start.line()..=end.line() {
        location.source().with_line(number, |line| {
            writeln!(fmt, "{:>width$} | {}", number, line, width = gutter.len())
        })?;
    }

    // El fin es exclusivo; un rango vacío aún recibe una marca
    let first = start.column().max(1);
    let last = end.column().saturating_sub(1).max(first);

    let padding = " ".repeat((first - 1) as usize);
    let carets = "^".repeat((last - first + 1) as usize);
    writeln!(fmt, "{} | {}{}", gutter, padding, carets)
}

impl<E: Error> sealed::Sealed for Located<E> {}

impl<E: Error> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.val()
    }

    fn location(&self) -> &Location {
        Located::location(self)
    }
}
