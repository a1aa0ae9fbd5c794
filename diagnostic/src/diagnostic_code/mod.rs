/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Error,
  Warning,
}

/// Unique identifier for each type of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
  // Scan errors
  UnexpectedCharacter,
  UnterminatedString,

  // Parse errors
  UnexpectedToken,
  ExpectedExpression,
  InvalidAssignmentTarget,
  TooManyArguments,
  TooManyParameters,

  // Resolve errors
  VariableAlreadyDeclared,
  SelfReferencingInitializer,
  ReturnOutsideFunction,
  ReturnValueFromInitializer,
  ThisOutsideClass,
  SuperOutsideClass,
  SuperWithoutSuperclass,
  InheritFromSelf,

  // Driver errors
  InvalidArguments,
  FileNotFound,

  // Runtime errors
  OperandMustBeNumber,
  OperandsMustBeNumbers,
  OperandsMustBeNumbersOrStrings,
  DivisionByZero,
  UndefinedVariable,
  NotCallable,
  WrongNumberOfArguments,
  OnlyInstancesHaveProperties,
  OnlyInstancesHaveFields,
  UndefinedProperty,
  SuperclassMustBeClass,

  // Warnings
  UnusedVariable,
}

impl DiagnosticCode {
  pub fn code(&self) -> &'static str {
    match self {
      // Scan errors
      Self::UnexpectedCharacter => "E0001",
      Self::UnterminatedString => "E0002",

      // Parse errors
      Self::UnexpectedToken => "E0101",
      Self::ExpectedExpression => "E0102",
      Self::InvalidAssignmentTarget => "E0103",
      Self::TooManyArguments => "E0104",
      Self::TooManyParameters => "E0105",

      // Resolve errors
      Self::VariableAlreadyDeclared => "E0201",
      Self::SelfReferencingInitializer => "E0202",
      Self::ReturnOutsideFunction => "E0203",
      Self::ReturnValueFromInitializer => "E0204",
      Self::ThisOutsideClass => "E0205",
      Self::SuperOutsideClass => "E0206",
      Self::SuperWithoutSuperclass => "E0207",
      Self::InheritFromSelf => "E0208",

      // Driver errors
      Self::InvalidArguments => "E0301",
      Self::FileNotFound => "E0302",

      // Runtime errors
      Self::OperandMustBeNumber => "R0001",
      Self::OperandsMustBeNumbers => "R0002",
      Self::OperandsMustBeNumbersOrStrings => "R0003",
      Self::DivisionByZero => "R0004",
      Self::UndefinedVariable => "R0005",
      Self::NotCallable => "R0006",
      Self::WrongNumberOfArguments => "R0007",
      Self::OnlyInstancesHaveProperties => "R0008",
      Self::OnlyInstancesHaveFields => "R0009",
      Self::UndefinedProperty => "R0010",
      Self::SuperclassMustBeClass => "R0011",

      // Warnings
      Self::UnusedVariable => "W0001",
    }
  }

  pub fn severity(&self) -> Severity {
    match self {
      Self::UnusedVariable => Severity::Warning,
      _ => Severity::Error,
    }
  }

  /// Runtime-phase codes render as `<message>` / `[line N]`; every other
  /// code renders as `[line N] Error<where>: <message>`.
  pub fn is_runtime(&self) -> bool {
    matches!(
      self,
      Self::OperandMustBeNumber
        | Self::OperandsMustBeNumbers
        | Self::OperandsMustBeNumbersOrStrings
        | Self::DivisionByZero
        | Self::UndefinedVariable
        | Self::NotCallable
        | Self::WrongNumberOfArguments
        | Self::OnlyInstancesHaveProperties
        | Self::OnlyInstancesHaveFields
        | Self::UndefinedProperty
        | Self::SuperclassMustBeClass
    )
  }
}
